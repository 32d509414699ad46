use serde::{Deserialize, Serialize};

/// Handler inventory returned for service-discovery tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiscoveryManifest {
    /// Registered service objects.
    pub data_link: DataLink,
    /// Registered function handlers.
    pub business_logic: BusinessLogic,
    /// Registered auth handlers.
    pub auth: AuthHandlers,
}

/// Data section of a [`DiscoveryManifest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataLink {
    /// Service object names.
    pub service_objects: Vec<String>,
}

/// Functions section of a [`DiscoveryManifest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessLogic {
    /// Function handler names.
    pub handlers: Vec<String>,
}

/// Auth section of a [`DiscoveryManifest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthHandlers {
    /// Auth handler names.
    pub handlers: Vec<String>,
}

impl DiscoveryManifest {
    /// Builds a manifest, sorting each list so output is stable.
    #[must_use]
    pub fn new(
        mut service_objects: Vec<String>,
        mut functions: Vec<String>,
        mut auth: Vec<String>,
    ) -> Self {
        service_objects.sort_unstable();
        functions.sort_unstable();
        auth.sort_unstable();
        Self {
            data_link: DataLink { service_objects },
            business_logic: BusinessLogic {
                handlers: functions,
            },
            auth: AuthHandlers { handlers: auth },
        }
    }
}
