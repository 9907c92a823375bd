use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// One upstream deployment: the official server or a private fork.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub substitutions: IndexMap<String, String>,
    #[serde(default)]
    pub overrides: IndexMap<String, String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demon_list: Option<String>,
    #[serde(default)]
    pub weekly_leaderboard: bool,
    // Fork-specific protocol values; fall back to the gateway defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_version: Option<String>,
}

impl ServerDescriptor {
    // The main deployment is the one without an id; "" counts as no id.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn is_default(&self) -> bool {
        self.id_str().is_empty()
    }

    pub fn procedure_name<'a>(&'a self, procedure: &'a str) -> &'a str {
        self.overrides
            .get(procedure)
            .map(String::as_str)
            .unwrap_or(procedure)
    }

    pub fn procedure_url(&self, procedure: &str) -> String {
        format!("{}{}.php", self.endpoint, self.procedure_name(procedure))
    }

    pub fn safe_view(&self) -> SafeServerView {
        SafeServerView {
            id: self.id.clone().filter(|id| !id.trim().is_empty()),
            name: self.name.clone(),
            pinned: self.pinned,
            link: self.link.clone(),
            author: self.author.clone(),
            author_link: self.author_link.clone(),
            timestamp_suffix: self.timestamp_suffix.clone(),
            demon_list: self.demon_list.clone(),
            weekly_leaderboard: self.weekly_leaderboard,
        }
    }
}

// Client-facing projection of a descriptor. Never carries the endpoint,
// parameter rewrites or protocol secrets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SafeServerView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub pinned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demon_list: Option<String>,
    pub weekly_leaderboard: bool,
}

pub fn builtin_servers() -> Vec<ServerDescriptor> {
    vec![ServerDescriptor {
        id: None,
        name: "Geometry Dash".to_string(),
        endpoint: "http://www.boomlings.com/database/".to_string(),
        pinned: true,
        link: Some("https://store.steampowered.com/app/322170/Geometry_Dash/".to_string()),
        author: Some("RobTop".to_string()),
        author_link: Some("https://twitter.com/RobTopGames".to_string()),
        demon_list: Some("https://pointercrate.com/".to_string()),
        weekly_leaderboard: true,
        ..ServerDescriptor::default()
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_parses_camel_case_json() {
        let raw = r#"{
            "id": "gdps",
            "name": "Some GDPS",
            "endpoint": "https://gdps.example/database/",
            "authorLink": "https://example.com",
            "substitutions": {"levelID": "lvlID"},
            "overrides": {"getGJUserInfo20": "getUserInfoV2"},
            "timestampSuffix": " ago"
        }"#;
        let server: ServerDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(server.id_str(), "gdps");
        assert!(!server.pinned);
        assert!(!server.disabled);
        assert_eq!(server.author_link.as_deref(), Some("https://example.com"));
        assert_eq!(server.procedure_name("getGJUserInfo20"), "getUserInfoV2");
        assert_eq!(server.procedure_name("getGJLevels21"), "getGJLevels21");
        assert_eq!(
            server.procedure_url("getGJUserInfo20"),
            "https://gdps.example/database/getUserInfoV2.php"
        );
    }

    #[test]
    fn substitutions_keep_declared_order() {
        let raw = r#"{
            "name": "Fork",
            "endpoint": "https://fork.example/",
            "substitutions": {"zeta": "z", "alpha": "a", "mid": "m"}
        }"#;
        let server: ServerDescriptor = serde_json::from_str(raw).unwrap();
        let keys: Vec<&str> = server.substitutions.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn empty_id_is_treated_as_default() {
        let server = ServerDescriptor {
            id: Some("  ".to_string()),
            ..ServerDescriptor::default()
        };
        assert!(server.is_default());
        assert_eq!(server.safe_view().id, None);
    }

    #[test]
    fn safe_view_serialization_omits_internal_fields() {
        let mut server = builtin_servers().remove(0);
        server.secret = Some("hidden".to_string());
        server
            .substitutions
            .insert("a".to_string(), "b".to_string());
        let json = serde_json::to_value(server.safe_view()).unwrap();
        let obj = json.as_object().unwrap();
        for field in ["endpoint", "substitutions", "overrides", "disabled", "secret"] {
            assert!(!obj.contains_key(field), "leaked {}", field);
        }
        assert_eq!(obj["name"], "Geometry Dash");
    }
}
