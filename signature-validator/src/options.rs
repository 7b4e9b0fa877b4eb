/// Settings for a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Check certificate notBefore/notAfter. Defaults to true.
    pub check_validity_period: bool,
    /// Unix seconds at which validity is judged; the current time when unset.
    pub verification_time: Option<i64>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        VerifyOptions {
            check_validity_period: true,
            verification_time: None,
        }
    }
}

impl VerifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validity_check(mut self, enabled: bool) -> Self {
        self.check_validity_period = enabled;
        self
    }

    pub fn at_time(mut self, unix_seconds: i64) -> Self {
        self.verification_time = Some(unix_seconds);
        self
    }
}
