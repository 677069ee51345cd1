use serde::{Deserialize, Serialize};

/// Per-chunk metadata as reported by the chunk-metadata endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Name of the team that claimed the chunk, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

impl ChunkMeta {
    pub fn is_claimed(&self) -> bool {
        self.team.as_deref().is_some_and(|team| !team.is_empty())
    }
}

/// One element of `GET /v1/chunk_meta/...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetaEntry {
    pub x: i64,
    pub z: i64,
    #[serde(default)]
    pub meta: ChunkMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub z: f64,
}

impl Player {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uuid)
    }
}

/// Latest published state of one dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionMeta {
    #[serde(default)]
    pub players: Vec<Player>,
    /// Ticks into the current day, `0..24000`.
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub day: Option<i64>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default, rename = "spawnX")]
    pub spawn_x: Option<f64>,
    #[serde(default, rename = "spawnZ")]
    pub spawn_z: Option<f64>,
}

impl DimensionMeta {
    pub fn player_named(&self, name: &str) -> Option<&Player> {
        self.players
            .iter()
            .find(|p| p.name.as_deref() == Some(name) || p.uuid == name)
    }

    /// In-game clock as `HH:MM`, with tick 0 at 06:00.
    pub fn clock(&self) -> Option<String> {
        let ticks = self.time?.rem_euclid(24_000);
        let minutes = (ticks * 60 / 1000 + 6 * 60) % (24 * 60);
        Some(format!("{:02}:{:02}", minutes / 60, minutes % 60))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerMeta {
    #[serde(default)]
    pub name: Option<String>,
}

/// Envelope used by both metadata endpoints: `{"meta": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaResponse<T> {
    #[serde(default)]
    pub meta: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimension_poll_response() {
        let body = r#"{"meta":{"players":[{"uuid":"abcd-ef","x":100,"z":200}]}}"#;
        let parsed: MetaResponse<DimensionMeta> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.meta.players.len(), 1);
        let player = &parsed.meta.players[0];
        assert_eq!((player.x, player.z), (100.0, 200.0));
        assert_eq!(player.display_name(), "abcd-ef");
        assert_eq!(parsed.meta.clock(), None);
    }

    #[test]
    fn parses_full_dimension_meta() {
        let body = r#"{"meta":{"time":18000,"day":12,"weather":"raining","spawnX":-40.5,
            "spawnY":64,"spawnZ":12,"players":[{"name":"Steve","uuid":"u1","x":1.5,"y":70,"z":-2}]}}"#;
        let parsed: MetaResponse<DimensionMeta> = serde_json::from_str(body).unwrap();
        let meta = parsed.meta;
        assert_eq!(meta.day, Some(12));
        assert_eq!(meta.weather.as_deref(), Some("raining"));
        assert_eq!(meta.spawn_x, Some(-40.5));
        assert_eq!(meta.spawn_z, Some(12.0));
        assert_eq!(meta.clock().as_deref(), Some("00:00"));
        assert_eq!(meta.player_named("Steve").map(|p| p.y), Some(70.0));
        assert!(meta.player_named("Alex").is_none());
    }

    #[test]
    fn clock_starts_at_six() {
        let meta = DimensionMeta {
            time: Some(0),
            ..DimensionMeta::default()
        };
        assert_eq!(meta.clock().as_deref(), Some("06:00"));
        let noon = DimensionMeta {
            time: Some(6_000),
            ..DimensionMeta::default()
        };
        assert_eq!(noon.clock().as_deref(), Some("12:00"));
    }

    #[test]
    fn missing_meta_is_empty() {
        let parsed: MetaResponse<DimensionMeta> = serde_json::from_str("{}").unwrap();
        assert!(parsed.meta.players.is_empty());
    }

    #[test]
    fn chunk_meta_claim_flag() {
        let entries: Vec<ChunkMetaEntry> = serde_json::from_str(
            r#"[{"x":1,"z":2,"meta":{"team":"Red"}},{"x":3,"z":4,"meta":{}},{"x":5,"z":6,"meta":{"team":""}}]"#,
        )
        .unwrap();
        let claimed: Vec<bool> = entries.iter().map(|e| e.meta.is_claimed()).collect();
        assert_eq!(claimed, vec![true, false, false]);
        assert!(!ChunkMeta::default().is_claimed());
    }
}
