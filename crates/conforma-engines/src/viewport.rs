use serde::{Deserialize, Serialize};

/// A named rendering configuration applied to a page before navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub is_mobile: bool,
}

impl ViewportSpec {
    pub fn desktop() -> Self {
        Self {
            name: "desktop".to_string(),
            width: 1280,
            height: 800,
            is_mobile: false,
        }
    }

    pub fn mobile() -> Self {
        Self {
            name: "mobile".to_string(),
            width: 375,
            height: 667,
            is_mobile: true,
        }
    }

    /// The viewports every URL is validated in, in report order.
    pub fn standard_pair() -> Vec<Self> {
        vec![Self::desktop(), Self::mobile()]
    }
}

impl std::fmt::Display for ViewportSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}x{})", self.name, self.width, self.height)
    }
}
