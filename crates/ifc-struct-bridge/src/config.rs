// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export configuration

use crate::defaults;
use crate::domain::ApplicationInfo;
use crate::units::LengthUnit;
use serde::{Deserialize, Serialize};

/// Authoring tool an export is tailored for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTool {
    #[default]
    Generic,
    Revit,
    Tekla,
}

impl TargetTool {
    /// Rewrite the application metadata for this tool
    ///
    /// Applying the same tool twice has no further effect.
    pub fn apply(self, config: &mut ExportConfig) {
        let suffix = match self {
            TargetTool::Generic => return,
            TargetTool::Revit => " for Revit",
            TargetTool::Tekla => " for Tekla",
        };
        if !config.application.name.ends_with(suffix) {
            config.application.name.push_str(suffix);
        }
        if self == TargetTool::Revit {
            config.application.version = defaults::TARGET_TOOL_VERSION.to_string();
        }
    }
}

/// Settings for one export call
///
/// Deserializes from JSON with every field optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Application written as IfcApplication
    pub application: ApplicationInfo,
    /// Organization name of the application developer
    pub application_developer: String,
    /// Target tool overrides applied at the start of the export
    pub target: TargetTool,
    /// Length unit declared in the project unit assignment
    pub length_unit: LengthUnit,
    /// Header FILE_NAME name
    pub file_name: Option<String>,
    /// Header FILE_NAME author
    pub author: Option<String>,
    /// Header FILE_NAME organization
    pub organization: Option<String>,
    /// Header FILE_NAME time stamp; left empty when unset so output is reproducible
    pub timestamp: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            application: ApplicationInfo {
                name: defaults::APPLICATION_NAME.to_string(),
                version: defaults::APPLICATION_VERSION.to_string(),
            },
            application_developer: defaults::APPLICATION_DEVELOPER.to_string(),
            target: TargetTool::Generic,
            length_unit: LengthUnit::default(),
            file_name: None,
            author: None,
            organization: None,
            timestamp: None,
        }
    }
}

impl ExportConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Set the application name and version
    pub fn with_application(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.application = ApplicationInfo {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    /// Set the target tool
    pub fn with_target(mut self, target: TargetTool) -> Self {
        self.target = target;
        self
    }

    /// Set the length unit
    pub fn with_length_unit(mut self, unit: LengthUnit) -> Self {
        self.length_unit = unit;
        self
    }

    /// Set the header file name
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Set the header author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the header organization
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Set the header time stamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Copy of this config with the target tool overrides applied
    pub fn resolved(&self) -> Self {
        let mut config = self.clone();
        config.target.apply(&mut config);
        config
    }
}
