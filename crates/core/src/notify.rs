//! Notifications exchanged with the display layer.
//!
//! Both directions use the envelope `{"notification": NAME, "payload": ...}`.

use crate::domain::config::WidgetConfig;
use crate::domain::plan::DayPlan;
use crate::domain::votes::VoteUpdate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "notification", content = "payload")]
pub enum Inbound {
    #[serde(rename = "FETCH_WHATSFORDINNER")]
    FetchWhatsForDinner(WidgetConfig),
    #[serde(rename = "REGISTER_VOTE")]
    RegisterVote(VoteRequest),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub meal_name: String,
    #[serde(default)]
    pub vote_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "notification", content = "payload")]
pub enum Outbound {
    #[serde(rename = "WHATSFORDINNER_RESULT")]
    WhatsForDinnerResult(Vec<DayPlan>),
    #[serde(rename = "VOTE_UPDATE")]
    VoteUpdate(VoteUpdate),
}

impl Outbound {
    pub fn name(&self) -> &'static str {
        match self {
            Self::WhatsForDinnerResult(_) => "WHATSFORDINNER_RESULT",
            Self::VoteUpdate(_) => "VOTE_UPDATE",
        }
    }
}
