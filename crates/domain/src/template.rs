//! Built-in rule templates offered to the rule builder.

use serde::Serialize;
use serde_json::Map;

use crate::automation::{
    AutomationAction, AutomationCondition, AutomationRule, AutomationTrigger, BotAction,
    ConditionKind, Operator, ToolAction,
};
use crate::error::StagehandError;

/// A named, pre-filled rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTemplate {
    pub name: String,
    pub description: String,
    pub trigger: AutomationTrigger,
    pub conditions: Vec<AutomationCondition>,
    pub actions: Vec<AutomationAction>,
}

impl RuleTemplate {
    /// The templates shipped with stagehand.
    #[must_use]
    pub fn builtin() -> Vec<Self> {
        vec![
            Self {
                name: "Stream Started Notification".to_string(),
                description: "Run a bot action when the stream starts".to_string(),
                trigger: AutomationTrigger::new("StreamStateChanged")
                    .with_filter("outputState", "OBS_WEBSOCKET_OUTPUT_STARTED"),
                conditions: Vec::new(),
                actions: vec![
                    AutomationAction::bot(BotAction::DoAction {
                        action_name: "Stream Started".to_string(),
                        args: Map::new(),
                    })
                    .described("Trigger the Stream Started bot action"),
                ],
            },
            Self {
                name: "Gaming Scene Auto-Setup".to_string(),
                description: "Enable game capture and lower desktop audio on the Gaming scene"
                    .to_string(),
                trigger: AutomationTrigger::new("CurrentProgramSceneChanged")
                    .with_filter("sceneName", "Gaming"),
                conditions: Vec::new(),
                actions: vec![
                    AutomationAction::tool(ToolAction::SetSceneItemEnabled {
                        scene_name: "Gaming".to_string(),
                        source_name: "Game Capture".to_string(),
                        scene_item_enabled: true,
                    })
                    .described("Enable Game Capture source"),
                    AutomationAction::tool(ToolAction::SetInputVolume {
                        input_name: "Desktop Audio".to_string(),
                        input_volume_mul: Some(0.8),
                        input_volume_db: None,
                    })
                    .described("Lower desktop audio volume"),
                ],
            },
            Self {
                name: "Mute Alert".to_string(),
                description: "Show an alert when a microphone is muted".to_string(),
                trigger: AutomationTrigger::new("InputMuteStateChanged")
                    .with_filter("inputMuted", true),
                conditions: vec![AutomationCondition {
                    description: Some("Input name contains \"Mic\"".to_string()),
                    ..AutomationCondition::new(
                        ConditionKind::Source,
                        "inputName",
                        Operator::Contains,
                        "Mic",
                    )
                }],
                actions: vec![
                    AutomationAction::tool(ToolAction::SetSceneItemEnabled {
                        scene_name: "current".to_string(),
                        source_name: "Muted Alert".to_string(),
                        scene_item_enabled: true,
                    })
                    .described("Show muted alert overlay"),
                ],
            },
        ]
    }

    /// Turn the template into a fresh, enabled rule.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the template is malformed.
    pub fn instantiate(&self) -> Result<AutomationRule, StagehandError> {
        AutomationRule::builder()
            .name(self.name.clone())
            .trigger(self.trigger.clone())
            .conditions(self.conditions.iter().cloned())
            .actions(self.actions.iter().cloned())
            .build()
    }
}
