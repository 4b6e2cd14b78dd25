/// Decimal places kept when a float argument is turned into a cache key.
pub const FLOAT_KEY_PRECISION: i32 = 5;
