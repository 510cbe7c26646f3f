use odpt_proxy_model::{BusstopPole, OdptBusstopPole};

/// Optional `/busstoppole` filters. All active filters must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopFilter {
    pub id: Option<String>,
    pub title: Option<String>,
    pub same_as: Option<String>,
}

impl StopFilter {
    pub fn matches(&self, pole: &OdptBusstopPole, title: &str) -> bool {
        if let Some(id) = self.id.as_deref() {
            if pole.id != id {
                return false;
            }
        }
        if let Some(fragment) = self.title.as_deref() {
            if !title.contains(fragment) {
                return false;
            }
        }
        if let Some(same_as) = self.same_as.as_deref() {
            if pole.same_as != same_as {
                return false;
            }
        }
        true
    }
}

/// `dc:title` wins over the polymorphic `title`; a localized title yields its
/// Japanese entry.
pub fn resolve_title(pole: &OdptBusstopPole) -> &str {
    if !pole.dc_title.is_empty() {
        return &pole.dc_title;
    }
    pole.title
        .as_ref()
        .and_then(|title| title.text())
        .unwrap_or_default()
}

pub fn map_busstop(pole: OdptBusstopPole, title: String) -> BusstopPole {
    BusstopPole {
        id: pole.id,
        record_type: pole.record_type,
        same_as: pole.same_as,
        date: pole.date,
        title,
        long: pole.long,
        lat: pole.lat,
        operator: pole.operator,
    }
}

pub fn filter_busstops(poles: Vec<OdptBusstopPole>, filter: &StopFilter) -> Vec<BusstopPole> {
    poles
        .into_iter()
        .filter_map(|pole| {
            let title = resolve_title(&pole).to_string();
            filter
                .matches(&pole, &title)
                .then(|| map_busstop(pole, title))
        })
        .collect()
}

pub fn parse_busstops(data: &[u8]) -> Result<Vec<OdptBusstopPole>, serde_json::Error> {
    serde_json::from_slice(data)
}
