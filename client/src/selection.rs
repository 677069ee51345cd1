use webmap_shared::{DimensionMeta, MapSource};

/// Which server/dimension the viewer shows and where it starts.
///
/// Changing the source never clears caches: keys are scoped by source, so stale entries just
/// stop being requested.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionContext {
    pub source: MapSource,
    /// World point placed at the canvas centre on (re)centring.
    pub origin: (f64, f64),
    /// No origin was given for this source; take it from the next reported spawn.
    pub follow_spawn: bool,
    /// Dimensions the page offers for switching.
    pub dimensions: Vec<String>,
    /// Player name to centre on once the first snapshot arrives.
    pub focus_player: Option<String>,
}

impl SelectionContext {
    pub fn new(source: MapSource) -> Self {
        let dimensions = vec![source.dimension.clone()];
        Self {
            source,
            origin: (0.0, 0.0),
            follow_spawn: true,
            dimensions,
            focus_player: None,
        }
    }

    /// Build from `data-*` attributes of the mount element, falling back to the page path
    /// `/map/{server}/{dimension}` and its `?x=&z=&player=` query.
    pub fn resolve(attr: impl Fn(&str) -> Option<String>, path: &str, query: &str) -> Option<Self> {
        let from_path = parse_map_path(path);
        let server = attr("data-server")
            .and_then(|s| s.trim().parse().ok())
            .or(from_path.as_ref().map(|(server, _)| *server))?;
        let dimension = attr("data-dimension")
            .filter(|d| !d.trim().is_empty())
            .or(from_path.map(|(_, dim)| dim))?;

        let mut ctx = Self::new(MapSource::new(server, dimension.trim()));

        let params = parse_query(query);
        let param = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        let coord = |attr_name: &str, key: &str| {
            attr(attr_name)
                .or_else(|| param(key))
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        let (x, z) = (coord("data-origin-x", "x"), coord("data-origin-z", "z"));
        ctx.follow_spawn = x.is_none() && z.is_none();
        ctx.origin = (x.unwrap_or(0.0), z.unwrap_or(0.0));

        if let Some(list) = attr("data-dimensions") {
            let dims: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
            if !dims.is_empty() {
                ctx.dimensions = dims;
            }
        }
        if !ctx.dimensions.contains(&ctx.source.dimension) {
            ctx.dimensions.insert(0, ctx.source.dimension.clone());
        }

        ctx.focus_player = param("player").filter(|p| !p.is_empty());
        Some(ctx)
    }

    /// Switch dimension. The new dimension starts at its spawn once that is known.
    /// Returns `false` if it was already active.
    pub fn set_dimension(&mut self, dimension: &str) -> bool {
        if self.source.dimension == dimension {
            return false;
        }
        self.source.dimension = dimension.to_string();
        self.origin = (0.0, 0.0);
        self.follow_spawn = true;
        if !self.dimensions.iter().any(|d| d == dimension) {
            self.dimensions.push(dimension.to_string());
        }
        true
    }

    /// Move the origin onto the spawn in `meta` if this source is still waiting for one.
    /// Returns `true` when the origin changed and the view should recentre.
    pub fn adopt_spawn(&mut self, meta: &DimensionMeta) -> bool {
        if !self.follow_spawn {
            return false;
        }
        let (Some(x), Some(z)) = (meta.spawn_x, meta.spawn_z) else {
            return false;
        };
        if !x.is_finite() || !z.is_finite() {
            return false;
        }
        self.origin = (x, z);
        self.follow_spawn = false;
        true
    }
}

fn parse_map_path(path: &str) -> Option<(i64, String)> {
    let mut segments = path.trim_matches('/').split('/');
    if segments.next()? != "map" {
        return None;
    }
    let server = segments.next()?.parse().ok()?;
    let dimension = percent_decode(segments.next()?);
    if dimension.is_empty() {
        return None;
    }
    Some((server, dimension))
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (percent_decode(k), percent_decode(v)),
            None => (percent_decode(pair), String::new()),
        })
        .collect()
}

fn percent_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
