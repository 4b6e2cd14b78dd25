use crate::utils::AsAny;
use crate::Result;
use std::fmt;

/// Common behaviors of the rules that can trigger a block.
pub trait SentinelRule: AsAny + fmt::Debug + Send + Sync {
    fn resource_name(&self) -> String;
    fn is_valid(&self) -> Result<()> {
        Ok(())
    }
}
