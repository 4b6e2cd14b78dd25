use super::{ParamsList, ParamsMap, TokenResult};

/// EntryContext travels through the slot chain with one call:
/// the protected resource, what the call carries, and the check result so far.
#[derive(Debug, Default)]
pub struct EntryContext {
    resource: String,
    input: SentinelInput,
    result: TokenResult,
}

impl EntryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_resource(&mut self, resource: String) {
        self.resource = resource;
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn set_input(&mut self, input: SentinelInput) {
        self.input = input;
    }

    pub fn input(&self) -> &SentinelInput {
        &self.input
    }

    pub fn set_result(&mut self, result: TokenResult) {
        self.result = result;
    }

    pub fn result(&self) -> &TokenResult {
        &self.result
    }

    pub fn is_blocked(&self) -> bool {
        self.result.is_blocked()
    }
}

/// What a call carries into the hotspot checks.
/// A rule picks its argument from `attachments` by `param_key`, or from `args` by `param_index`.
#[derive(Debug)]
pub struct SentinelInput {
    batch_count: u32,
    args: Option<ParamsList>,
    attachments: Option<ParamsMap>,
}

impl Default for SentinelInput {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SentinelInput {
    pub fn new(batch_count: u32) -> Self {
        SentinelInput {
            batch_count,
            args: None,
            attachments: None,
        }
    }

    pub fn batch_count(&self) -> u32 {
        self.batch_count
    }

    pub fn set_args(&mut self, args: ParamsList) {
        self.args = Some(args);
    }

    pub fn args(&self) -> Option<&ParamsList> {
        self.args.as_ref()
    }

    pub fn set_attachments(&mut self, attachments: ParamsMap) {
        self.attachments = Some(attachments);
    }

    pub fn attachments(&self) -> Option<&ParamsMap> {
        self.attachments.as_ref()
    }
}
