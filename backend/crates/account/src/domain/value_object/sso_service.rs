//! Third-party helpdesk services a login can be redirected to

use std::fmt;
use std::str::FromStr;

use crate::error::AccountError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsoService {
    Freshdesk,
    Zendesk,
}

impl SsoService {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            SsoService::Freshdesk => "freshdesk",
            SsoService::Zendesk => "zendesk",
        }
    }
}

impl FromStr for SsoService {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "freshdesk" => Ok(SsoService::Freshdesk),
            "zendesk" => Ok(SsoService::Zendesk),
            _ => Err(AccountError::ServiceNotSupported),
        }
    }
}

impl fmt::Display for SsoService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
