//! In-memory model of a production tool's scene collection and outputs.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use stagehand_domain::automation::ToolAction;
use stagehand_domain::event::IncomingEvent;
use stagehand_domain::state::LiveState;

const OUTPUT_STARTED: &str = "OBS_WEBSOCKET_OUTPUT_STARTED";
const OUTPUT_STOPPED: &str = "OBS_WEBSOCKET_OUTPUT_STOPPED";

/// Scene name that refers to whatever is currently on program.
const CURRENT_SCENE: &str = "current";

const REPLAY_FILE: &str = "Replay.mkv";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Input {
    pub muted: bool,
    pub volume_mul: f64,
    pub settings: Map<String, Value>,
}

impl Input {
    fn new() -> Self {
        Self {
            muted: false,
            volume_mul: 1.0,
            settings: Map::new(),
        }
    }
}

/// Result of applying one action.
#[derive(Debug)]
pub(crate) struct Applied {
    pub message: String,
    pub events: Vec<IncomingEvent>,
}

impl Applied {
    fn new(message: impl Into<String>, events: Vec<IncomingEvent>) -> Self {
        Self {
            message: message.into(),
            events,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Studio {
    program_scene: String,
    preview_scene: Option<String>,
    scenes: BTreeMap<String, BTreeMap<String, bool>>,
    inputs: BTreeMap<String, Input>,
    streaming: bool,
    recording: bool,
    virtual_cam: bool,
    replay_buffer: bool,
    values: Map<String, Value>,
}

impl Studio {
    /// A small scene collection good enough for demos and tests.
    pub fn demo() -> Self {
        let scene = |sources: &[(&str, bool)]| {
            sources
                .iter()
                .map(|(name, visible)| ((*name).to_string(), *visible))
                .collect::<BTreeMap<_, _>>()
        };
        let scenes = BTreeMap::from([
            (
                "Intro".to_string(),
                scene(&[("Logo", true), ("Countdown", true)]),
            ),
            (
                "Gaming".to_string(),
                scene(&[
                    ("Game Capture", false),
                    ("Webcam", true),
                    ("Muted Alert", false),
                ]),
            ),
            (
                "Just Chatting".to_string(),
                scene(&[("Webcam", true), ("Chat", true), ("Muted Alert", false)]),
            ),
            ("BRB".to_string(), scene(&[("BRB Screen", true)])),
        ]);
        let inputs = ["Mic/Aux", "Desktop Audio", "Browser Alerts"]
            .into_iter()
            .map(|name| (name.to_string(), Input::new()))
            .collect();

        Self {
            program_scene: "Intro".to_string(),
            preview_scene: None,
            scenes,
            inputs,
            streaming: false,
            recording: false,
            virtual_cam: false,
            replay_buffer: false,
            values: Map::new(),
        }
    }

    pub fn live_state(&self) -> LiveState {
        LiveState {
            current_program_scene: Some(self.program_scene.clone()),
            current_preview_scene: self.preview_scene.clone(),
            stream_active: self.streaming,
            record_active: self.recording,
            values: self.values.clone(),
        }
    }

    pub fn set_value(&mut self, key: String, value: Value) {
        self.values.insert(key, value);
    }

    pub fn program_scene(&self) -> &str {
        &self.program_scene
    }

    pub fn source_enabled(&self, scene: &str, source: &str) -> Option<bool> {
        self.scenes.get(scene)?.get(source).copied()
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.get(name)
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Apply one action, returning a human-readable message and the events
    /// the change produced, or the reason it was refused.
    pub fn apply(&mut self, action: &ToolAction) -> Result<Applied, String> {
        match action {
            ToolAction::SetCurrentProgramScene { scene_name } => {
                let scene = self.resolve_scene(scene_name)?;
                self.program_scene.clone_from(&scene);
                Ok(Applied::new(
                    format!("switched program to \"{scene}\""),
                    vec![scene_changed("CurrentProgramSceneChanged", scene)],
                ))
            }
            ToolAction::SetCurrentPreviewScene { scene_name } => {
                let scene = self.resolve_scene(scene_name)?;
                self.preview_scene = Some(scene.clone());
                Ok(Applied::new(
                    format!("switched preview to \"{scene}\""),
                    vec![scene_changed("CurrentPreviewSceneChanged", scene)],
                ))
            }
            ToolAction::SetSceneItemEnabled {
                scene_name,
                source_name,
                scene_item_enabled,
            } => {
                let scene = self.resolve_scene(scene_name)?;
                let visible = self
                    .scenes
                    .get_mut(&scene)
                    .and_then(|sources| sources.get_mut(source_name))
                    .ok_or_else(|| format!("no source \"{source_name}\" in scene \"{scene}\""))?;
                *visible = *scene_item_enabled;
                let verb = if *scene_item_enabled { "shown" } else { "hidden" };
                Ok(Applied::new(
                    format!("\"{source_name}\" {verb} in \"{scene}\""),
                    vec![
                        IncomingEvent::named("SceneItemEnableStateChanged")
                            .with("sceneName", scene)
                            .with("sourceName", source_name.clone())
                            .with("sceneItemEnabled", *scene_item_enabled),
                    ],
                ))
            }
            ToolAction::SetInputMute {
                input_name,
                input_muted,
            } => {
                self.input_mut(input_name)?.muted = *input_muted;
                Ok(mute_applied(input_name, *input_muted))
            }
            ToolAction::ToggleInputMute { input_name } => {
                let input = self.input_mut(input_name)?;
                input.muted = !input.muted;
                let muted = input.muted;
                Ok(mute_applied(input_name, muted))
            }
            ToolAction::SetInputVolume {
                input_name,
                input_volume_mul,
                input_volume_db,
            } => {
                let mul = match (input_volume_mul, input_volume_db) {
                    (Some(mul), _) => *mul,
                    (None, Some(db)) => 10_f64.powf(db / 20.0),
                    (None, None) => return Err("no volume given".to_string()),
                };
                if !(0.0..=20.0).contains(&mul) {
                    return Err(format!("volume {mul} out of range"));
                }
                self.input_mut(input_name)?.volume_mul = mul;
                Ok(Applied::new(
                    format!("volume of \"{input_name}\" set to {mul}"),
                    vec![
                        IncomingEvent::named("InputVolumeChanged")
                            .with("inputName", input_name.clone())
                            .with("inputVolumeMul", mul)
                            .with("inputVolumeDb", 20.0 * mul.log10()),
                    ],
                ))
            }
            ToolAction::SetInputSettings {
                input_name,
                input_settings,
                overlay,
            } => {
                let Value::Object(settings) = input_settings else {
                    return Err("input settings must be an object".to_string());
                };
                let input = self.input_mut(input_name)?;
                if overlay.unwrap_or(true) {
                    input
                        .settings
                        .extend(settings.iter().map(|(k, v)| (k.clone(), v.clone())));
                } else {
                    input.settings.clone_from(settings);
                }
                let merged = Value::Object(input.settings.clone());
                Ok(Applied::new(
                    format!("settings of \"{input_name}\" updated"),
                    vec![
                        IncomingEvent::named("InputSettingsChanged")
                            .with("inputName", input_name.clone())
                            .with("inputSettings", merged),
                    ],
                ))
            }
            ToolAction::RefreshBrowserSource { input_name } => {
                self.input_mut(input_name)?;
                Ok(Applied::new(
                    format!("browser source \"{input_name}\" refreshed"),
                    Vec::new(),
                ))
            }
            ToolAction::SaveScreenshot {
                source_name,
                image_format,
                image_file_path,
            } => {
                let known = self.scenes.contains_key(source_name)
                    || self.inputs.contains_key(source_name)
                    || self.scenes.values().any(|s| s.contains_key(source_name));
                if !known {
                    return Err(format!("no source named \"{source_name}\""));
                }
                Ok(Applied::new(
                    format!("{image_format} screenshot of \"{source_name}\" saved to {image_file_path}"),
                    Vec::new(),
                ))
            }
            ToolAction::StartStream => {
                switch_output(&mut self.streaming, true, "StreamStateChanged", "stream")
            }
            ToolAction::StopStream => {
                switch_output(&mut self.streaming, false, "StreamStateChanged", "stream")
            }
            ToolAction::StartRecord => {
                switch_output(&mut self.recording, true, "RecordStateChanged", "record")
            }
            ToolAction::StopRecord => {
                switch_output(&mut self.recording, false, "RecordStateChanged", "record")
            }
            ToolAction::StartVirtualCam => switch_output(
                &mut self.virtual_cam,
                true,
                "VirtualcamStateChanged",
                "virtual camera",
            ),
            ToolAction::StopVirtualCam => switch_output(
                &mut self.virtual_cam,
                false,
                "VirtualcamStateChanged",
                "virtual camera",
            ),
            ToolAction::StartReplayBuffer => switch_output(
                &mut self.replay_buffer,
                true,
                "ReplayBufferStateChanged",
                "replay buffer",
            ),
            ToolAction::SaveReplayBuffer => {
                if !self.replay_buffer {
                    return Err("replay buffer not active".to_string());
                }
                Ok(Applied::new(
                    "replay buffer saved",
                    vec![
                        IncomingEvent::named("ReplayBufferSaved")
                            .with("savedReplayPath", REPLAY_FILE),
                    ],
                ))
            }
            ToolAction::TriggerStudioModeTransition => {
                let Some(preview) = self.preview_scene.take() else {
                    return Err("studio mode not enabled".to_string());
                };
                let previous = std::mem::replace(&mut self.program_scene, preview.clone());
                self.preview_scene = Some(previous.clone());
                Ok(Applied::new(
                    format!("transitioned to \"{preview}\""),
                    vec![
                        scene_changed("CurrentProgramSceneChanged", preview),
                        scene_changed("CurrentPreviewSceneChanged", previous),
                    ],
                ))
            }
        }
    }

    fn resolve_scene(&self, name: &str) -> Result<String, String> {
        let name = if name == CURRENT_SCENE {
            self.program_scene.as_str()
        } else {
            name
        };
        if self.scenes.contains_key(name) {
            Ok(name.to_string())
        } else {
            Err(format!("no scene named \"{name}\""))
        }
    }

    fn input_mut(&mut self, name: &str) -> Result<&mut Input, String> {
        self.inputs
            .get_mut(name)
            .ok_or_else(|| format!("no input named \"{name}\""))
    }
}

fn mute_applied(input_name: &str, muted: bool) -> Applied {
    let verb = if muted { "muted" } else { "unmuted" };
    Applied::new(
        format!("\"{input_name}\" {verb}"),
        vec![
            IncomingEvent::named("InputMuteStateChanged")
                .with("inputName", input_name)
                .with("inputMuted", muted),
        ],
    )
}

fn switch_output(flag: &mut bool, on: bool, event: &str, label: &str) -> Result<Applied, String> {
    if *flag == on {
        let state = if on { "active" } else { "not active" };
        return Err(format!("{label} already {state}"));
    }
    *flag = on;
    let verb = if on { "started" } else { "stopped" };
    let output_state = if on { OUTPUT_STARTED } else { OUTPUT_STOPPED };
    Ok(Applied::new(
        format!("{label} {verb}"),
        vec![
            IncomingEvent::named(event)
                .with("outputActive", on)
                .with("outputState", output_state),
        ],
    ))
}

fn scene_changed(event: &str, scene: String) -> IncomingEvent {
    IncomingEvent::named(event).with("sceneName", scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_start_on_intro_scene_with_outputs_off() {
        let studio = Studio::demo();
        let state = studio.live_state();
        assert_eq!(state.current_program_scene.as_deref(), Some("Intro"));
        assert!(!state.stream_active);
        assert!(!state.record_active);
    }

    #[test]
    fn should_switch_program_scene_and_emit_event() {
        let mut studio = Studio::demo();
        let applied = studio
            .apply(&ToolAction::SetCurrentProgramScene {
                scene_name: "Gaming".to_string(),
            })
            .unwrap();
        assert_eq!(studio.program_scene(), "Gaming");
        assert_eq!(applied.events[0].name, "CurrentProgramSceneChanged");
        assert_eq!(applied.events[0].payload["sceneName"], "Gaming");
    }

    #[test]
    fn should_refuse_unknown_scene() {
        let mut studio = Studio::demo();
        let result = studio.apply(&ToolAction::SetCurrentProgramScene {
            scene_name: "Nope".to_string(),
        });
        assert_eq!(result.unwrap_err(), "no scene named \"Nope\"");
    }

    #[test]
    fn should_resolve_current_scene_alias() {
        let mut studio = Studio::demo();
        studio
            .apply(&ToolAction::SetCurrentProgramScene {
                scene_name: "Gaming".to_string(),
            })
            .unwrap();
        studio
            .apply(&ToolAction::SetSceneItemEnabled {
                scene_name: "current".to_string(),
                source_name: "Muted Alert".to_string(),
                scene_item_enabled: true,
            })
            .unwrap();
        assert_eq!(studio.source_enabled("Gaming", "Muted Alert"), Some(true));
    }

    #[test]
    fn should_toggle_mute_and_report_new_state() {
        let mut studio = Studio::demo();
        let applied = studio
            .apply(&ToolAction::ToggleInputMute {
                input_name: "Mic/Aux".to_string(),
            })
            .unwrap();
        assert!(studio.input("Mic/Aux").unwrap().muted);
        assert_eq!(applied.events[0].payload["inputMuted"], true);
    }

    #[test]
    fn should_convert_decibels_to_multiplier() {
        let mut studio = Studio::demo();
        studio
            .apply(&ToolAction::SetInputVolume {
                input_name: "Desktop Audio".to_string(),
                input_volume_mul: None,
                input_volume_db: Some(0.0),
            })
            .unwrap();
        let volume = studio.input("Desktop Audio").unwrap().volume_mul;
        assert!((volume - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_merge_settings_when_overlaying() {
        let mut studio = Studio::demo();
        for settings in [json!({"url": "a"}), json!({"width": 800})] {
            studio
                .apply(&ToolAction::SetInputSettings {
                    input_name: "Browser Alerts".to_string(),
                    input_settings: settings,
                    overlay: None,
                })
                .unwrap();
        }
        let settings = &studio.input("Browser Alerts").unwrap().settings;
        assert_eq!(settings["url"], "a");
        assert_eq!(settings["width"], 800);
    }

    #[test]
    fn should_refuse_to_start_stream_twice() {
        let mut studio = Studio::demo();
        let applied = studio.apply(&ToolAction::StartStream).unwrap();
        assert_eq!(applied.events[0].payload["outputState"], OUTPUT_STARTED);
        assert!(studio.is_streaming());
        assert_eq!(
            studio.apply(&ToolAction::StartStream).unwrap_err(),
            "stream already active"
        );
    }

    #[test]
    fn should_swap_program_and_preview_on_transition() {
        let mut studio = Studio::demo();
        let transition = ToolAction::TriggerStudioModeTransition;
        assert!(studio.apply(&transition).is_err());

        studio
            .apply(&ToolAction::SetCurrentPreviewScene {
                scene_name: "BRB".to_string(),
            })
            .unwrap();
        studio.apply(&transition).unwrap();

        let state = studio.live_state();
        assert_eq!(state.current_program_scene.as_deref(), Some("BRB"));
        assert_eq!(state.current_preview_scene.as_deref(), Some("Intro"));
    }

    #[test]
    fn should_require_active_replay_buffer_to_save() {
        let mut studio = Studio::demo();
        assert!(studio.apply(&ToolAction::SaveReplayBuffer).is_err());
        studio.apply(&ToolAction::StartReplayBuffer).unwrap();
        let applied = studio.apply(&ToolAction::SaveReplayBuffer).unwrap();
        assert_eq!(applied.events[0].name, "ReplayBufferSaved");
    }
}
