use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::contracts::CoreError;
use crate::data_models::lead::{ChannelKind, ContactInfo, LeadSource, LeadType, Qualification};

/// Canonical form produced by the normalizer, prior to deduplication and
/// storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLead {
    pub source: LeadSource,
    pub contact: ContactInfo,
    pub lead_type: LeadType,
    pub urgency: u8,
    pub intent_signals: BTreeSet<String>,
    pub qualification: Qualification,
    pub raw_text: String,
}

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+?1?[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").expect("valid phone regex")
});

static BUDGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?[\d,]+(\s*[-–—]\s*\$?[\d,]+)?").expect("valid budget regex"));

const URGENCY_RANK_1: &[&str] = &["urgent", "asap", "immediately", "emergency", "today", "now", "quick"];
const URGENCY_RANK_2: &[&str] = &["soon", "this week", "deadline", "time sensitive"];
const URGENCY_RANK_3: &[&str] = &["interested", "looking for", "need", "want", "inquiry"];

/// Urgency keyword classifier (§4.2.1): first rank that matches wins.
pub fn classify_urgency_from_text(text: &str) -> u8 {
    let lower = text.to_lowercase();
    if URGENCY_RANK_1.iter().any(|kw| lower.contains(kw)) {
        9
    } else if URGENCY_RANK_2.iter().any(|kw| lower.contains(kw)) {
        7
    } else if URGENCY_RANK_3.iter().any(|kw| lower.contains(kw)) {
        5
    } else {
        3
    }
}

const INTENT_KEYWORDS: &[(&str, &[&str])] = &[
    ("buying_intent", &["buy", "purchase", "looking to buy"]),
    ("selling_intent", &["sell", "list my", "selling"]),
    ("rental_intent", &["rent", "lease", "rental"]),
    ("investment_intent", &["investment", "investor", "roi", "cap rate"]),
    ("financing_need", &["mortgage", "financing", "pre-approval", "loan"]),
    ("agent_request", &["need an agent", "realtor", "agent"]),
    ("valuation_request", &["what's my home worth", "valuation", "appraisal"]),
    ("market_research", &["market trends", "comps", "market research"]),
];

/// Intent signal extraction (§4.2.2): membership is additive.
pub fn extract_intent_signals(text: &str) -> BTreeSet<String> {
    let lower = text.to_lowercase();
    let mut tags = BTreeSet::new();
    for (tag, keywords) in INTENT_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            tags.insert(tag.to_string());
        }
    }
    tags
}

/// Budget/timeline parsing (§4.2.3).
pub fn parse_budget(text: &str) -> Option<(f64, f64)> {
    let m = BUDGET_RE.find(text)?;
    let matched = m.as_str();
    let parts: Vec<f64> = matched
        .split(|c| c == '-' || c == '\u{2013}' || c == '\u{2014}')
        .filter_map(|part| {
            let digits: String = part.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            digits.parse::<f64>().ok()
        })
        .collect();
    match parts.as_slice() {
        [single] => Some((single * 0.8, single * 1.2)),
        [a, b] => Some((a.min(*b), a.max(*b))),
        _ => None,
    }
}

pub fn parse_timeline(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    if lower.contains("immediately") || lower.contains("asap") || lower.contains("right away") {
        Some("immediate")
    } else if lower.contains("1-2 months") || lower.contains("next couple months") {
        Some("1-2 months")
    } else if lower.contains("3 months") || lower.contains("few months") {
        Some("3 months")
    } else if lower.contains("6 months") || lower.contains("half a year") {
        Some("6 months")
    } else if lower.contains("1 year") || lower.contains("next year") {
        Some("1 year")
    } else {
        None
    }
}

fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE.find(text).map(|m| m.as_str().to_string())
}

/// Normalizes a raw source payload into a `NormalizedLead`, per the
/// per-source rules in §4.2.
pub fn normalize(raw_payload: &Value, source: LeadSource) -> Result<NormalizedLead, CoreError> {
    if !raw_payload.is_object() {
        return Err(CoreError::validation(
            "raw payload must be a JSON object".to_string(),
        ));
    }
    match source {
        LeadSource::Gmail => normalize_gmail(raw_payload),
        LeadSource::MetaAds => normalize_meta(raw_payload),
        LeadSource::Website => normalize_website(raw_payload),
        LeadSource::Slack | LeadSource::Referral => normalize_warm(raw_payload, source),
        LeadSource::ThirdParty | LeadSource::Other => normalize_cold(raw_payload, source),
    }
}

fn get_str<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

fn normalize_gmail(raw: &Value) -> Result<NormalizedLead, CoreError> {
    let body = get_str(raw, "body").unwrap_or_default();
    let from_name = raw
        .get("from")
        .and_then(|f| f.get("name"))
        .and_then(Value::as_str);
    let from_email = raw.get("from").and_then(|f| f.get("email")).and_then(Value::as_str);
    let name = from_name
        .map(|s| s.to_string())
        .or_else(|| from_email.map(|e| e.split('@').next().unwrap_or("Unknown").to_string()))
        .unwrap_or_else(|| "Unknown".to_string());
    let phone = extract_phone(body);

    Ok(NormalizedLead {
        source: LeadSource::Gmail,
        contact: ContactInfo {
            name,
            email: from_email.map(|s| s.to_string()),
            phone,
            preferred_channel: ChannelKind::Email,
            timezone: get_str(raw, "timezone").unwrap_or("UTC").to_string(),
        },
        lead_type: LeadType::Warm,
        urgency: classify_urgency_from_text(body),
        intent_signals: extract_intent_signals(body),
        qualification: qualification_from_text(body),
        raw_text: body.to_string(),
    })
}

fn normalize_meta(raw: &Value) -> Result<NormalizedLead, CoreError> {
    let name = get_str(raw, "full_name").unwrap_or("Unknown").to_string();
    let text = get_str(raw, "message").unwrap_or_default();
    Ok(NormalizedLead {
        source: LeadSource::MetaAds,
        contact: ContactInfo {
            name,
            email: get_str(raw, "email").map(|s| s.to_string()),
            phone: get_str(raw, "phone").map(|s| s.to_string()),
            preferred_channel: ChannelKind::Sms,
            timezone: get_str(raw, "timezone").unwrap_or("UTC").to_string(),
        },
        lead_type: LeadType::Warm,
        urgency: 5,
        intent_signals: extract_intent_signals(text),
        qualification: qualification_from_text(text),
        raw_text: text.to_string(),
    })
}

fn normalize_website(raw: &Value) -> Result<NormalizedLead, CoreError> {
    let form_name = get_str(raw, "formName").unwrap_or("").to_lowercase();
    let text = get_str(raw, "message").unwrap_or_default();
    let urgency = if form_name.contains("quote") {
        9
    } else if form_name.contains("contact") {
        8
    } else {
        6
    };
    Ok(NormalizedLead {
        source: LeadSource::Website,
        contact: ContactInfo {
            name: get_str(raw, "name").unwrap_or("Unknown").to_string(),
            email: get_str(raw, "email").map(|s| s.to_string()),
            phone: get_str(raw, "phone").map(|s| s.to_string()),
            preferred_channel: ChannelKind::Email,
            timezone: get_str(raw, "timezone").unwrap_or("UTC").to_string(),
        },
        lead_type: LeadType::Hot,
        urgency,
        intent_signals: extract_intent_signals(text),
        qualification: qualification_from_text(text),
        raw_text: text.to_string(),
    })
}

fn normalize_warm(raw: &Value, source: LeadSource) -> Result<NormalizedLead, CoreError> {
    let text = get_str(raw, "message").unwrap_or_default();
    Ok(NormalizedLead {
        source,
        contact: ContactInfo {
            name: get_str(raw, "name").unwrap_or("Unknown").to_string(),
            email: get_str(raw, "email").map(|s| s.to_string()),
            phone: get_str(raw, "phone").map(|s| s.to_string()),
            preferred_channel: ChannelKind::Email,
            timezone: get_str(raw, "timezone").unwrap_or("UTC").to_string(),
        },
        lead_type: LeadType::Warm,
        urgency: 4,
        intent_signals: extract_intent_signals(text),
        qualification: qualification_from_text(text),
        raw_text: text.to_string(),
    })
}

fn normalize_cold(raw: &Value, source: LeadSource) -> Result<NormalizedLead, CoreError> {
    let text = get_str(raw, "message").unwrap_or_default();
    Ok(NormalizedLead {
        source,
        contact: ContactInfo {
            name: get_str(raw, "name").unwrap_or("Unknown").to_string(),
            email: get_str(raw, "email").map(|s| s.to_string()),
            phone: get_str(raw, "phone").map(|s| s.to_string()),
            preferred_channel: ChannelKind::Email,
            timezone: get_str(raw, "timezone").unwrap_or("UTC").to_string(),
        },
        lead_type: LeadType::Cold,
        urgency: 2,
        intent_signals: extract_intent_signals(text),
        qualification: qualification_from_text(text),
        raw_text: text.to_string(),
    })
}

fn qualification_from_text(text: &str) -> Qualification {
    let (budget_min, budget_max) = parse_budget(text).unzip();
    Qualification {
        budget_min,
        budget_max,
        location: None,
        property_type: None,
        timeline: parse_timeline(text).map(|s| s.to_string()),
        score: 0.0,
    }
}
