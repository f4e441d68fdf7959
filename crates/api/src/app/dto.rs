use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use unitdesk_assignments::Assignment;
use unitdesk_catalog::{NewPerformer, NewService, Performer, Service, split_skills};
use unitdesk_core::DomainResult;
use unitdesk_events::EventEnvelope;
use unitdesk_infra::AssignmentView;

// -------------------------
// Request DTOs
// -------------------------

/// Amount sent either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

impl Amount {
    fn into_text(self) -> String {
        match self {
            Amount::Number(n) => n.to_string(),
            Amount::Text(s) => s,
        }
    }
}

/// Skills sent as a list or as one comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
    List(Vec<String>),
    Text(String),
}

impl SkillsInput {
    fn into_list(self) -> Vec<String> {
        match self {
            SkillsInput::List(list) => list,
            SkillsInput::Text(raw) => split_skills(&raw),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Amount>,
    pub duration: Option<String>,
    pub description: Option<String>,
}

impl CreateServiceRequest {
    pub fn into_input(self) -> DomainResult<NewService> {
        NewService::try_new(
            self.name,
            self.category,
            self.price.map(Amount::into_text),
            self.duration,
            self.description,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePerformerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Option<SkillsInput>,
    pub rating: Option<f64>,
    pub hourly_rate: Option<Amount>,
    pub experience: Option<String>,
}

impl CreatePerformerRequest {
    pub fn into_input(self) -> DomainResult<NewPerformer> {
        NewPerformer::try_new(
            self.name,
            self.email,
            self.phone,
            self.skills.map(SkillsInput::into_list).unwrap_or_default(),
            self.rating,
            self.hourly_rate.map(Amount::into_text),
            self.experience,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SetPerformerStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub service_id: Option<String>,
    pub performer_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListServicesQuery {
    pub category: Option<String>,
    pub status: Option<String>,
    /// `recent` for newest first.
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListPerformersQuery {
    pub status: Option<String>,
    pub skill: Option<String>,
    /// `status` for available first, then by rating.
    pub sort: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListAssignmentsQuery {
    pub status: Option<String>,
    pub service_id: Option<String>,
    pub performer_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub scope: Option<String>,
    /// Comma-separated field names.
    pub fields: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    #[serde(alias = "dateFrom")]
    pub from: Option<String>,
    #[serde(alias = "dateTo")]
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DistributeRequest {
    pub message: Option<String>,
    pub channels: Option<Vec<String>>,
    pub settings: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChannelRequest {
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub text: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CollectRequest {
    pub source: Option<String>,
    pub data: Option<JsonValue>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListDataQuery {
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(alias = "dateFrom")]
    pub from: Option<String>,
    #[serde(alias = "dateTo")]
    pub to: Option<String>,
    pub limit: Option<usize>,
}

// -------------------------
// Response mapping
// -------------------------

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn service_to_json(s: &Service) -> JsonValue {
    json!({
        "id": s.id_typed().as_str(),
        "name": s.name(),
        "category": s.category(),
        "price": s.price(),
        "duration": s.duration(),
        "description": s.description(),
        "status": s.status().as_str(),
        "created_at": iso(s.created_at()),
    })
}

pub fn performer_to_json(p: &Performer) -> JsonValue {
    json!({
        "id": p.id_typed().as_str(),
        "name": p.name(),
        "email": p.email(),
        "phone": p.phone(),
        "skills": p.skills(),
        "primary_skill": p.primary_skill(),
        "rating": p.rating(),
        "status": p.status().as_str(),
        "hourly_rate": p.hourly_rate(),
        "experience": p.experience(),
        "created_at": iso(p.created_at()),
    })
}

pub fn assignment_to_json(a: &Assignment) -> JsonValue {
    json!({
        "id": a.id_typed().as_str(),
        "service_id": a.service_id().as_str(),
        "performer_id": a.performer_id().as_str(),
        "status": a.status().as_str(),
        "assigned_at": iso(a.assigned_at()),
        "completed_at": a.completed_at().map(iso),
    })
}

pub fn assignment_view_to_json(v: &AssignmentView) -> JsonValue {
    let mut value = assignment_to_json(&v.assignment);
    if let Some(obj) = value.as_object_mut() {
        obj.insert("service_name".to_string(), json!(v.service_name));
        obj.insert("performer_name".to_string(), json!(v.performer_name));
    }
    value
}

pub fn envelope_to_json(e: &EventEnvelope<JsonValue>) -> JsonValue {
    json!({
        "event_id": e.event_id().to_string(),
        "sequence_number": e.sequence_number(),
        "aggregate_type": e.aggregate_type(),
        "aggregate_id": e.aggregate_id(),
        "event_type": e.event_type(),
        "occurred_at": e.occurred_at_iso(),
        "payload": e.payload(),
    })
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: Option<&str>) -> Vec<&str> {
    raw.map(|r| r.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_accepts_number_and_text() {
        let from_number: CreateServiceRequest = serde_json::from_value(json!({
            "name": "Уборка офиса", "category": "Клининг", "price": 3000, "duration": "3 часа"
        }))
        .unwrap();
        assert_eq!(from_number.into_input().unwrap().price(), 3000);

        let from_text: CreateServiceRequest = serde_json::from_value(json!({
            "name": "Уборка офиса", "category": "Клининг", "price": "3000", "duration": "3 часа"
        }))
        .unwrap();
        assert_eq!(from_text.into_input().unwrap().price(), 3000);
    }

    #[test]
    fn negative_or_fractional_price_is_rejected() {
        for price in [json!(-5), json!(12.5), json!("abc")] {
            let req: CreateServiceRequest = serde_json::from_value(json!({
                "name": "x", "category": "y", "price": price, "duration": "1 час"
            }))
            .unwrap();
            assert!(req.into_input().is_err());
        }
    }

    #[test]
    fn skills_accept_list_or_csv() {
        let csv: CreatePerformerRequest =
            serde_json::from_value(json!({"name": "A", "skills": "IT, Ремонт ,,"})).unwrap();
        assert_eq!(csv.into_input().unwrap().skills(), ["IT", "Ремонт"]);

        let list: CreatePerformerRequest =
            serde_json::from_value(json!({"name": "A", "skills": ["IT", " "]})).unwrap();
        assert_eq!(list.into_input().unwrap().skills(), ["IT"]);

        let missing: CreatePerformerRequest = serde_json::from_value(json!({"name": "A"})).unwrap();
        assert!(missing.into_input().is_err());
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(Some("name, ,skills")), vec!["name", "skills"]);
        assert!(split_list(None).is_empty());
    }
}
