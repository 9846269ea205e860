use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    UserAuth,
    Investment,
    Proposal,
    Vote,
    ContractUpgrade,
    EmergencyAction,
    Security,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserAuth => "user_auth",
            Self::Investment => "investment",
            Self::Proposal => "proposal",
            Self::Vote => "vote",
            Self::ContractUpgrade => "contract_upgrade",
            Self::EmergencyAction => "emergency_action",
            Self::Security => "security",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user_auth" => Some(Self::UserAuth),
            "investment" => Some(Self::Investment),
            "proposal" => Some(Self::Proposal),
            "vote" => Some(Self::Vote),
            "contract_upgrade" => Some(Self::ContractUpgrade),
            "emergency_action" => Some(Self::EmergencyAction),
            "security" => Some(Self::Security),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
}
