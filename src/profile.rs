use serde::{Deserialize, Serialize};

pub const DEFAULT_ROUTING_MODE: &str = "bypass_cn";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub listen: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub dns: String,
    #[serde(default)]
    pub ech: String,
    #[serde(default = "default_routing_mode")]
    pub routing_mode: String,
    /// Fields the form does not know about, carried through every save.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_routing_mode() -> String {
    DEFAULT_ROUTING_MODE.to_string()
}

impl ServerProfile {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            server: String::new(),
            listen: String::new(),
            token: String::new(),
            ip: String::new(),
            dns: String::new(),
            ech: String::new(),
            routing_mode: default_routing_mode(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn routing(&self) -> RoutingMode {
        RoutingMode::from_wire(&self.routing_mode).unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Server => &self.server,
            Field::Listen => &self.listen,
            Field::Token => &self.token,
            Field::Ip => &self.ip,
            Field::Dns => &self.dns,
            Field::Ech => &self.ech,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Server => &mut self.server,
            Field::Listen => &mut self.listen,
            Field::Token => &mut self.token,
            Field::Ip => &mut self.ip,
            Field::Dns => &mut self.dns,
            Field::Ech => &mut self.ech,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RoutingMode {
    Global,
    #[default]
    BypassCn,
    None,
}

impl RoutingMode {
    pub const ALL: [RoutingMode; 3] = [Self::Global, Self::BypassCn, Self::None];

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "global" => Some(Self::Global),
            "bypass_cn" => Some(Self::BypassCn),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::BypassCn => "bypass_cn",
            Self::None => "none",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::BypassCn => "Bypass CN",
            Self::None => "Direct",
        }
    }
}

/// Editable text fields of a server profile, in form order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Server,
    Listen,
    Token,
    Ip,
    Dns,
    Ech,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Self::Server,
        Self::Listen,
        Self::Token,
        Self::Ip,
        Self::Dns,
        Self::Ech,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Server => "Server address",
            Self::Listen => "Listen address",
            Self::Token => "Token",
            Self::Ip => "Preferred IP",
            Self::Dns => "DoH server",
            Self::Ech => "ECH domain",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Server => "example.com:443",
            Self::Listen => "127.0.0.1:30000",
            Self::Token => "optional",
            Self::Ip => "saas.sin.fan",
            Self::Dns => "dns.alidns.com/dns-query",
            Self::Ech => "cloudflare-ech.com",
        }
    }

    pub fn is_secret(self) -> bool {
        matches!(self, Self::Token)
    }
}

/// Unsaved edits of one profile. `base` is the copy the edits started from.
#[derive(Clone, Debug, PartialEq)]
pub struct FormDraft {
    base: ServerProfile,
    edited: ServerProfile,
    routing: Option<RoutingMode>,
}

impl FormDraft {
    pub fn from_profile(profile: &ServerProfile) -> Self {
        Self {
            base: profile.clone(),
            edited: profile.clone(),
            routing: RoutingMode::from_wire(&profile.routing_mode),
        }
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn name(&self) -> &str {
        self.base.display_name()
    }

    pub fn base(&self) -> &ServerProfile {
        &self.base
    }

    pub fn value(&self, field: Field) -> &str {
        self.edited.field(field)
    }

    pub fn set(&mut self, field: Field, value: &str) {
        *self.edited.field_mut(field) = value.to_string();
    }

    /// The selected routing mode, falling back to the default when nothing is selected.
    pub fn routing_mode(&self) -> RoutingMode {
        self.routing.unwrap_or_default()
    }

    pub fn set_routing_mode(&mut self, mode: RoutingMode) {
        self.routing = Some(mode);
    }

    pub fn is_dirty(&self) -> bool {
        Field::ALL
            .iter()
            .any(|field| self.edited.field(*field) != self.base.field(*field))
            || self.routing != RoutingMode::from_wire(&self.base.routing_mode)
    }

    /// Overlays the editable fields onto `latest`, keeping everything else it carries.
    pub fn merged_onto(&self, latest: &ServerProfile) -> ServerProfile {
        let mut merged = latest.clone();
        for field in Field::ALL {
            *merged.field_mut(field) = self.edited.field(field).to_string();
        }
        merged.routing_mode = self.routing_mode().as_wire().to_string();
        merged
    }

    pub fn mark_saved(&mut self, saved: &ServerProfile) {
        self.base = saved.clone();
    }

    pub fn rename(&mut self, name: &str) {
        self.base.name = name.to_string();
        self.edited.name = name.to_string();
    }
}
