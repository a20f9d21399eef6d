//! Action: the remote operation performed when a rule fires.
//!
//! An action is addressed either to the production tool ([`ToolRequest`]) or
//! to the automation bot ([`BotAction`]). Both payloads are closed sum types
//! so the dispatcher can match on them exhaustively.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::id::ActionId;

/// Variable name used by [`BotAction::FileExists`] when none is given.
pub const DEFAULT_FILE_VARIABLE: &str = "fileExists";
/// Variable name used by [`BotAction::FolderExists`] when none is given.
pub const DEFAULT_FOLDER_VARIABLE: &str = "folderExists";

/// One step of a rule's action list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationAction {
    #[serde(default)]
    pub id: ActionId,
    pub target: ActionTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AutomationAction {
    /// Action directed at the production tool.
    #[must_use]
    pub fn tool(request: impl Into<ToolRequest>) -> Self {
        Self::new(ActionTarget::Tool(request.into()))
    }

    /// Action directed at the automation bot.
    #[must_use]
    pub fn bot(action: BotAction) -> Self {
        Self::new(ActionTarget::Bot(action))
    }

    fn new(target: ActionTarget) -> Self {
        Self {
            id: ActionId::new(),
            target,
            description: None,
        }
    }

    /// Attach a human-readable description.
    #[must_use]
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the payload is well formed.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for empty batches, empty bot action names
    /// or empty paths.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.target {
            ActionTarget::Tool(ToolRequest::Batch(actions)) if actions.is_empty() => {
                Err(ValidationError::EmptyBatch)
            }
            ActionTarget::Tool(_) => Ok(()),
            ActionTarget::Bot(BotAction::DoAction { action_name, .. })
                if action_name.trim().is_empty() =>
            {
                Err(ValidationError::EmptyBotActionName)
            }
            ActionTarget::Bot(
                BotAction::FileExists { path, .. } | BotAction::FolderExists { path, .. },
            ) if path.trim().is_empty() => Err(ValidationError::EmptyPath),
            ActionTarget::Bot(_) => Ok(()),
        }
    }
}

impl std::fmt::Display for AutomationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => f.write_str(description),
            None => self.target.fmt(f),
        }
    }
}

/// The system an action is addressed to, with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ActionTarget {
    /// Sent to the production tool through the injected action handler.
    Tool(ToolRequest),
    /// Sent to the automation bot, or performed locally for utility checks.
    Bot(BotAction),
}

impl std::fmt::Display for ActionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tool(request) => write!(f, "tool {request}"),
            Self::Bot(action) => write!(f, "bot {action}"),
        }
    }
}

/// A single production-tool action or a batch handed over in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolRequest {
    Single(ToolAction),
    Batch(Vec<ToolAction>),
}

impl ToolRequest {
    /// Iterate over the contained actions in order.
    pub fn actions(&self) -> impl Iterator<Item = &ToolAction> {
        match self {
            Self::Single(action) => std::slice::from_ref(action).iter(),
            Self::Batch(actions) => actions.iter(),
        }
    }
}

impl From<ToolAction> for ToolRequest {
    fn from(action: ToolAction) -> Self {
        Self::Single(action)
    }
}

impl From<Vec<ToolAction>> for ToolRequest {
    fn from(actions: Vec<ToolAction>) -> Self {
        Self::Batch(actions)
    }
}

impl std::fmt::Display for ToolRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(action) => action.fmt(f),
            Self::Batch(actions) => {
                let names = actions
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "batch[{names}]")
            }
        }
    }
}

/// An operation understood by the production tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ToolAction {
    /// Switch the live (program) scene.
    SetCurrentProgramScene { scene_name: String },
    /// Switch the preview scene (studio mode).
    SetCurrentPreviewScene { scene_name: String },
    /// Show or hide a source inside a scene.
    SetSceneItemEnabled {
        scene_name: String,
        source_name: String,
        scene_item_enabled: bool,
    },
    SetInputMute {
        input_name: String,
        input_muted: bool,
    },
    ToggleInputMute { input_name: String },
    SetInputVolume {
        input_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_volume_mul: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_volume_db: Option<f64>,
    },
    SetInputSettings {
        input_name: String,
        input_settings: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overlay: Option<bool>,
    },
    RefreshBrowserSource { input_name: String },
    SaveScreenshot {
        source_name: String,
        image_format: String,
        image_file_path: String,
    },
    StartStream,
    StopStream,
    StartRecord,
    StopRecord,
    StartVirtualCam,
    StopVirtualCam,
    StartReplayBuffer,
    SaveReplayBuffer,
    TriggerStudioModeTransition,
}

impl std::fmt::Display for ToolAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetCurrentProgramScene { scene_name } => {
                write!(f, "setCurrentProgramScene({scene_name})")
            }
            Self::SetCurrentPreviewScene { scene_name } => {
                write!(f, "setCurrentPreviewScene({scene_name})")
            }
            Self::SetSceneItemEnabled {
                scene_name,
                source_name,
                scene_item_enabled,
            } => write!(
                f,
                "setSceneItemEnabled({scene_name}/{source_name}={scene_item_enabled})"
            ),
            Self::SetInputMute {
                input_name,
                input_muted,
            } => write!(f, "setInputMute({input_name}={input_muted})"),
            Self::ToggleInputMute { input_name } => write!(f, "toggleInputMute({input_name})"),
            Self::SetInputVolume { input_name, .. } => write!(f, "setInputVolume({input_name})"),
            Self::SetInputSettings { input_name, .. } => {
                write!(f, "setInputSettings({input_name})")
            }
            Self::RefreshBrowserSource { input_name } => {
                write!(f, "refreshBrowserSource({input_name})")
            }
            Self::SaveScreenshot { source_name, .. } => write!(f, "saveScreenshot({source_name})"),
            Self::StartStream => f.write_str("startStream"),
            Self::StopStream => f.write_str("stopStream"),
            Self::StartRecord => f.write_str("startRecord"),
            Self::StopRecord => f.write_str("stopRecord"),
            Self::StartVirtualCam => f.write_str("startVirtualCam"),
            Self::StopVirtualCam => f.write_str("stopVirtualCam"),
            Self::StartReplayBuffer => f.write_str("startReplayBuffer"),
            Self::SaveReplayBuffer => f.write_str("saveReplayBuffer"),
            Self::TriggerStudioModeTransition => f.write_str("triggerStudioModeTransition"),
        }
    }
}

/// An operation addressed to the automation bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotAction {
    /// Run a named remote action with arguments.
    DoAction {
        action_name: String,
        #[serde(default)]
        args: Map<String, Value>,
    },
    /// Check that a file exists and store the answer in a variable.
    FileExists {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable_name: Option<String>,
    },
    /// Check that a folder exists and store the answer in a variable.
    FolderExists {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable_name: Option<String>,
    },
}

impl BotAction {
    /// Shorthand for a [`BotAction::DoAction`] without arguments.
    #[must_use]
    pub fn run(action_name: impl Into<String>) -> Self {
        Self::DoAction {
            action_name: action_name.into(),
            args: Map::new(),
        }
    }
}

impl std::fmt::Display for BotAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DoAction { action_name, .. } => write!(f, "do_action({action_name})"),
            Self::FileExists {
                path,
                variable_name,
            } => write!(
                f,
                "file_exists({path} -> {})",
                variable_name.as_deref().unwrap_or(DEFAULT_FILE_VARIABLE)
            ),
            Self::FolderExists {
                path,
                variable_name,
            } => write!(
                f,
                "folder_exists({path} -> {})",
                variable_name.as_deref().unwrap_or(DEFAULT_FOLDER_VARIABLE)
            ),
        }
    }
}
