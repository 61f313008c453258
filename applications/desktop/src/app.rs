//! Main application window
//!
//! One `egui` panel holding the whole workflow: file selection, the effect
//! chain editor, the rename rule, the preset bar, and the render controls.
//! Preset loads fan out through the [`StateStore`]; everything the store
//! touches lives in the shared [`EditorState`] so watchers can refresh the
//! per-file destination previews.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use eframe::egui;
use tokio::runtime::Runtime;
use tracing::error;

use chef_audio::formats;
use chef_audio::registry::{EffectParams, EffectRegistry};
use chef_core::{
    AudioFile, NameChangeMode, NameChangeParameters, Preset, PresetMetadata, StateStore,
    StateValue, Transformation,
};
use chef_render::{RenderEvent, RenderWorker};
use chef_storage::{presets, SqlitePool};

/// JSON text being edited for one transformation's parameters
struct ParamDraft {
    text: String,
    valid: bool,
}

/// Everything the state-store watchers mutate
struct EditorState {
    preset: Preset,
    files: Vec<AudioFile>,
    param_drafts: Vec<ParamDraft>,
}

impl EditorState {
    fn new() -> Self {
        Self {
            preset: Preset::empty(),
            files: Vec::new(),
            param_drafts: Vec::new(),
        }
    }

    fn refresh_destinations(&mut self) {
        for file in &mut self.files {
            file.update_destination(&self.preset.name_change_parameters, &self.preset.ext);
        }
    }

    fn rebuild_param_drafts(&mut self) {
        self.param_drafts = self
            .preset
            .transformations
            .iter()
            .map(|t| ParamDraft {
                text: serde_json::to_string_pretty(&t.params)
                    .unwrap_or_else(|_| "{}".to_string()),
                valid: true,
            })
            .collect();
    }
}

struct ErrorDialog {
    title: String,
    message: String,
}

impl ErrorDialog {
    fn recipe(message: String) -> Self {
        Self {
            title: "Cannot render".to_string(),
            message,
        }
    }

    fn rejected_file(file_name: &str) -> Self {
        Self {
            title: "Unsupported file".to_string(),
            message: format!("\"{file_name}\" cannot be decoded and was not added."),
        }
    }

    fn generic() -> Self {
        Self {
            title: "Something went wrong".to_string(),
            message: "An unexpected error occurred. Check the log file in the application \
                      data directory for details."
                .to_string(),
        }
    }
}

/// A batch currently running on the worker thread
struct RenderState {
    worker: RenderWorker,
    total: usize,
    completed: usize,
    current: Option<String>,
}

enum ChainAction {
    Add,
    Remove(usize),
    MoveUp(usize),
    MoveDown(usize),
}

pub struct ChefApp {
    runtime: Runtime,
    pool: SqlitePool,
    registry: EffectRegistry,
    store: Rc<StateStore>,
    editor: Rc<RefCell<EditorState>>,
    presets: Vec<PresetMetadata>,
    /// Names from the installed-plugins table, offered alongside the
    /// built-in effects. A chain using one fails with an unknown-effect
    /// error until a matching effect is registered.
    plugin_effects: Vec<String>,
    rename_edit: Option<(i64, String)>,
    render: Option<RenderState>,
    dialog: Option<ErrorDialog>,
    status: String,
}

impl ChefApp {
    pub fn new(runtime: Runtime, pool: SqlitePool) -> Self {
        let store = Rc::new(StateStore::new());
        let editor = Rc::new(RefCell::new(EditorState::new()));
        wire_store(&store, &editor);

        let mut app = Self {
            runtime,
            pool,
            registry: EffectRegistry::with_builtin_effects(),
            store,
            editor,
            presets: Vec::new(),
            plugin_effects: Vec::new(),
            rename_edit: None,
            render: None,
            dialog: None,
            status: "Drop audio files anywhere in the window".to_string(),
        };
        app.refresh_presets();
        app.refresh_plugins();
        app.load_default_preset();
        app
    }

    fn refresh_plugins(&mut self) {
        match self
            .runtime
            .block_on(chef_storage::plugins::installed_plugins(&self.pool))
        {
            Ok(plugins) => {
                self.plugin_effects = plugins.into_iter().map(|p| p.name).collect();
            }
            Err(e) => self.report_error("listing installed plugins", &e),
        }
    }

    fn refresh_presets(&mut self) {
        match self.runtime.block_on(presets::get_metadata(&self.pool)) {
            Ok(metadata) => self.presets = metadata,
            Err(e) => self.report_error("listing presets", &e),
        }
    }

    fn load_default_preset(&mut self) {
        match self.runtime.block_on(presets::get_default(&self.pool)) {
            Ok(Some(preset)) => self.apply_loaded_preset(&preset),
            Ok(None) => {}
            Err(e) => self.report_error("loading default preset", &e),
        }
    }

    fn apply_loaded_preset(&mut self, preset: &Preset) {
        match serde_json::to_value(preset) {
            Ok(value) => {
                self.store.set_prop("loaded_preset", value);
                self.status = "Preset loaded".to_string();
            }
            Err(e) => self.report_error("serializing preset", &e),
        }
    }

    fn load_preset(&mut self, preset_id: i64) {
        match self
            .runtime
            .block_on(presets::get_by_id(&self.pool, preset_id))
        {
            Ok(preset) => self.apply_loaded_preset(&preset),
            Err(e) => self.report_error("loading preset", &e),
        }
    }

    fn save_current_preset(&mut self) {
        let preset = self.editor.borrow().preset.clone();
        match self.runtime.block_on(presets::save_preset(&self.pool, &preset)) {
            Ok(metadata) => {
                self.status = format!("Saved preset {}", metadata.name);
                self.refresh_presets();
            }
            Err(e) => self.report_error("saving preset", &e),
        }
    }

    fn add_file(&mut self, path: PathBuf) {
        if is_plugin_file(&path) {
            self.install_plugin(&path);
            return;
        }

        let mut file = AudioFile::new(path);
        if !formats::can_decode(file.source_ext()) {
            self.dialog = Some(ErrorDialog::rejected_file(&file.file_name()));
            return;
        }

        let mut state = self.editor.borrow_mut();
        if state.files.contains(&file) {
            return;
        }
        let rule = state.preset.name_change_parameters.clone();
        let ext = state.preset.ext.clone();
        file.update_destination(&rule, &ext);
        state.files.push(file);
    }

    /// Record a dropped plugin bundle and merge it into the available effects
    fn install_plugin(&mut self, path: &Path) {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let location = path.display().to_string();
        match self.runtime.block_on(chef_storage::plugins::save_plugin(
            &self.pool, &name, &location,
        )) {
            Ok(()) => {
                self.status = format!("Installed plugin {name}");
                self.refresh_plugins();
            }
            Err(e) => self.report_error("installing plugin", &e),
        }
    }

    fn start_render(&mut self) {
        let (files, preset) = {
            let state = self.editor.borrow();
            (state.files.clone(), state.preset.clone())
        };
        let total = files.len();
        let worker = RenderWorker::spawn(self.registry.clone(), files, preset);
        self.render = Some(RenderState {
            worker,
            total,
            completed: 0,
            current: None,
        });
        self.status = "Rendering…".to_string();
    }

    /// Drain worker progress; on termination recover the files so their
    /// decode caches survive for the next batch.
    fn poll_render(&mut self, ctx: &egui::Context) {
        let mut dialog = None;
        let mut status = None;
        let mut finished = false;

        if let Some(render) = self.render.as_mut() {
            ctx.request_repaint_after(Duration::from_millis(100));

            // Checked before draining: a finished thread cannot add events
            // after the drain, so the terminal event is never lost.
            finished = render.worker.is_finished();

            while let Some(event) = render.worker.try_next_event() {
                match event {
                    RenderEvent::Started { total } => render.total = total,
                    RenderEvent::FileStarted { file_name, .. } => {
                        render.current = Some(file_name);
                    }
                    RenderEvent::FileFinished { .. } => render.completed += 1,
                    RenderEvent::Failed { error } => {
                        if error.is_recipe_error() {
                            dialog = Some(ErrorDialog::recipe(error.to_string()));
                        } else {
                            error!(%error, "render batch failed");
                            dialog = Some(ErrorDialog::generic());
                        }
                        status = Some("Render failed".to_string());
                    }
                    RenderEvent::Finished { rendered } => {
                        status = Some(format!("Rendered {rendered} file(s)"));
                    }
                    RenderEvent::Cancelled { completed } => {
                        status = Some(format!("Cancelled after {completed} file(s)"));
                    }
                }
            }
        }

        if let Some(d) = dialog {
            self.dialog = Some(d);
        }
        if let Some(s) = status {
            self.status = s;
        }

        if finished {
            if let Some(render) = self.render.take() {
                let rendered_files = render.worker.join();
                let mut state = self.editor.borrow_mut();
                for file in rendered_files {
                    if let Some(slot) = state.files.iter_mut().find(|f| **f == file) {
                        *slot = file;
                    }
                }
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        for path in dropped {
            self.add_file(path);
        }
    }

    fn report_error(&mut self, context: &str, error: &dyn std::fmt::Display) {
        error!(context, error = %error, "operation failed");
        self.dialog = Some(ErrorDialog::generic());
    }

    fn preset_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Presets");

        let metas = self.presets.clone();
        let mut load_id = None;
        let mut default_id = None;
        let mut delete_id = None;
        let mut rename_commit = None;
        let mut save_current = false;

        ui.horizontal_wrapped(|ui| {
            for meta in &metas {
                ui.group(|ui| {
                    let renaming = matches!(&self.rename_edit, Some((id, _)) if *id == meta.id);
                    if renaming {
                        if let Some((_, draft)) = &mut self.rename_edit {
                            let response = ui.text_edit_singleline(draft);
                            if response.lost_focus() {
                                if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                                    rename_commit = Some((meta.id, draft.clone()));
                                } else {
                                    rename_commit = Some((meta.id, String::new()));
                                }
                            }
                        }
                    } else {
                        let label = if meta.default {
                            format!("★ {}", meta.name)
                        } else {
                            meta.name.clone()
                        };
                        if ui.button(label).on_hover_text("Load").clicked() {
                            load_id = Some(meta.id);
                        }
                        if ui.small_button("✏").on_hover_text("Rename").clicked() {
                            self.rename_edit = Some((meta.id, meta.name.clone()));
                        }
                        if ui.small_button("★").on_hover_text("Make default").clicked() {
                            default_id = Some(meta.id);
                        }
                        if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                            delete_id = Some(meta.id);
                        }
                    }
                });
            }
            if ui.button("Save current").clicked() {
                save_current = true;
            }
        });

        if let Some(id) = load_id {
            self.load_preset(id);
        }
        if let Some(id) = default_id {
            match self.runtime.block_on(presets::make_default(&self.pool, id)) {
                Ok(()) => self.refresh_presets(),
                Err(e) => self.report_error("setting default preset", &e),
            }
        }
        if let Some((id, new_name)) = rename_commit {
            self.rename_edit = None;
            if !new_name.is_empty() {
                match self
                    .runtime
                    .block_on(presets::rename_preset(&self.pool, id, &new_name))
                {
                    Ok(()) => self.refresh_presets(),
                    Err(e) => self.report_error("renaming preset", &e),
                }
            }
        }
        if let Some(id) = delete_id {
            match self.runtime.block_on(presets::delete(&self.pool, id)) {
                Ok(()) => self.refresh_presets(),
                Err(e) => self.report_error("deleting preset", &e),
            }
        }
        if save_current {
            self.save_current_preset();
        }
    }

    fn files_section(&mut self, ui: &mut egui::Ui) {
        let mut picked: Option<Vec<PathBuf>> = None;
        ui.horizontal(|ui| {
            ui.heading("Files");
            if ui.button("Add files…").clicked() {
                picked = rfd::FileDialog::new()
                    .add_filter("Audio", &formats::decodable_extensions())
                    .pick_files();
            }
            if ui.button("Clear").clicked() {
                self.editor.borrow_mut().files.clear();
            }
        });
        if let Some(paths) = picked {
            for path in paths {
                self.add_file(path);
            }
        }

        let mut removed = None;
        {
            let state = self.editor.borrow();
            if state.files.is_empty() {
                ui.label("Drop audio files here or use Add files…");
            }
            for (i, file) in state.files.iter().enumerate() {
                ui.horizontal(|ui| {
                    if ui.small_button("✖").clicked() {
                        removed = Some(i);
                    }
                    ui.label(file.file_name());
                    ui.label("→");
                    ui.monospace(format!("{}.{}", file.destination_name, file.destination_ext));
                });
            }
        }
        if let Some(i) = removed {
            self.editor.borrow_mut().files.remove(i);
        }
    }

    fn transform_section(&self, ui: &mut egui::Ui, pending: &mut Vec<(&'static str, StateValue)>) {
        ui.heading("Transformations");

        let mut available: Vec<String> = self
            .registry
            .available()
            .into_iter()
            .map(str::to_string)
            .collect();
        available.extend(self.plugin_effects.iter().cloned());
        let mut action = None;

        {
            let mut state = self.editor.borrow_mut();
            if state.param_drafts.len() != state.preset.transformations.len() {
                state.rebuild_param_drafts();
            }
            let EditorState {
                preset,
                param_drafts,
                ..
            } = &mut *state;
            let chain_len = preset.transformations.len();

            for (i, (transformation, draft)) in preset
                .transformations
                .iter_mut()
                .zip(param_drafts.iter_mut())
                .enumerate()
            {
                ui.push_id(i, |ui| {
                    ui.horizontal(|ui| {
                        let selected = transformation
                            .name
                            .clone()
                            .unwrap_or_else(|| "Select an effect".to_string());
                        egui::ComboBox::from_id_salt("effect_selector")
                            .selected_text(selected)
                            .show_ui(ui, |ui| {
                                for name in &available {
                                    let checked =
                                        transformation.name.as_deref() == Some(name.as_str());
                                    if ui.selectable_label(checked, name).clicked() && !checked {
                                        transformation.name = Some(name.clone());
                                    }
                                }
                            });

                        if ui
                            .add_enabled(i > 0, egui::Button::new("⬆").small())
                            .clicked()
                        {
                            action = Some(ChainAction::MoveUp(i));
                        }
                        if ui
                            .add_enabled(i + 1 < chain_len, egui::Button::new("⬇").small())
                            .clicked()
                        {
                            action = Some(ChainAction::MoveDown(i));
                        }
                        if ui.small_button("✖").clicked() {
                            action = Some(ChainAction::Remove(i));
                        }
                    });

                    let response = ui.add(
                        egui::TextEdit::multiline(&mut draft.text)
                            .code_editor()
                            .desired_rows(2),
                    );
                    if response.changed() {
                        match serde_json::from_str::<EffectParams>(&draft.text) {
                            Ok(params) => {
                                draft.valid = true;
                                transformation.params = params;
                            }
                            Err(_) => draft.valid = false,
                        }
                    }
                    if !draft.valid {
                        ui.colored_label(egui::Color32::RED, "Parameters are not valid JSON");
                    }
                });
            }
        }

        if ui.button("Add transformation").clicked() {
            action = Some(ChainAction::Add);
        }

        if let Some(action) = action {
            let updated = {
                let state = self.editor.borrow();
                let preset = &state.preset;
                match action {
                    ChainAction::Add => {
                        let mut transformations = preset.transformations.clone();
                        transformations.push(Transformation::empty());
                        transformations
                    }
                    ChainAction::Remove(i) => {
                        let mut transformations = preset.transformations.clone();
                        transformations.remove(i);
                        transformations
                    }
                    ChainAction::MoveUp(i) => preset.move_transform(i, i - 1).transformations,
                    ChainAction::MoveDown(i) => preset.move_transform(i, i + 1).transformations,
                }
            };
            if let Ok(value) = serde_json::to_value(&updated) {
                pending.push(("transformations", value));
            }
        }
    }

    fn name_section(&self, ui: &mut egui::Ui, pending: &mut Vec<(&'static str, StateValue)>) {
        ui.heading("Output naming");

        let (mut rule, mut ext) = {
            let state = self.editor.borrow();
            (
                state.preset.name_change_parameters.clone(),
                state.preset.ext.clone(),
            )
        };

        let mut rule_changed = false;
        ui.horizontal(|ui| {
            rule_changed |= ui
                .radio_value(&mut rule.mode, NameChangeMode::Replace, "Replace")
                .changed();
            rule_changed |= ui
                .radio_value(&mut rule.mode, NameChangeMode::Wildcards, "Wildcards")
                .changed();
        });

        match rule.mode {
            NameChangeMode::Replace => {
                ui.horizontal(|ui| {
                    ui.label("Replace");
                    rule_changed |= ui
                        .text_edit_singleline(&mut rule.replace_from_input)
                        .changed();
                    ui.label("with");
                    rule_changed |= ui.text_edit_singleline(&mut rule.replace_to_input).changed();
                });
            }
            NameChangeMode::Wildcards => {
                ui.horizontal(|ui| {
                    ui.label("Template");
                    rule_changed |= ui.text_edit_singleline(&mut rule.wildcards_input).changed();
                });
                ui.small("$item = source name, $date = current date");
            }
        }

        if rule_changed {
            if let Ok(value) = serde_json::to_value(&rule) {
                pending.push(("name_change", value));
            }
        }

        ui.horizontal(|ui| {
            ui.label("Output extension:");
            if ui.text_edit_singleline(&mut ext).changed() {
                pending.push(("output_ext", StateValue::String(ext.clone())));
            }
            ui.small("(empty keeps each file's own)");
        });
    }

    fn render_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Render");

        if let Some(render) = &self.render {
            let progress = if render.total == 0 {
                0.0
            } else {
                render.completed as f32 / render.total as f32
            };
            let text = match &render.current {
                Some(name) => format!("{}/{}  {}", render.completed, render.total, name),
                None => format!("{}/{}", render.completed, render.total),
            };
            ui.add(egui::ProgressBar::new(progress).text(text));
            if ui.button("Cancel").clicked() {
                render.worker.cancel();
            }
        } else {
            let ready = !self.editor.borrow().files.is_empty();
            if ui
                .add_enabled(ready, egui::Button::new("Render batch"))
                .clicked()
            {
                self.start_render();
            }
        }
    }

    fn show_dialog(&mut self, ctx: &egui::Context) {
        let Some(dialog) = &self.dialog else {
            return;
        };
        let title = dialog.title.clone();
        let message = dialog.message.clone();

        let mut close = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    close = true;
                }
            });
        if close {
            self.dialog = None;
        }
    }
}

impl eframe::App for ChefApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_render(ctx);
        self.handle_dropped_files(ctx);

        let mut pending: Vec<(&'static str, StateValue)> = Vec::new();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.preset_section(ui);
                ui.separator();
                self.files_section(ui);
                ui.separator();
                self.transform_section(ui, &mut pending);
                ui.separator();
                self.name_section(ui, &mut pending);
                ui.separator();
                self.render_section(ui);
            });
        });

        // Applied after the panels are done so the store watchers can borrow
        // the editor state freely.
        for (key, value) in pending {
            self.store.set_prop(key, value);
        }

        self.show_dialog(ctx);
    }
}

/// Wire the preset-load fan-out: `loaded_preset` splits into the three
/// editable keys, whose watchers apply the values to the editor and refresh
/// the destination previews.
fn wire_store(store: &StateStore, editor: &Rc<RefCell<EditorState>>) {
    store.set_reducers("loaded_preset", |preset| {
        (
            "output_ext".to_string(),
            preset
                .get("ext")
                .cloned()
                .unwrap_or_else(|| StateValue::String(String::new())),
        )
    });
    store.set_reducers("loaded_preset", |preset| {
        (
            "transformations".to_string(),
            preset
                .get("transformations")
                .cloned()
                .unwrap_or_else(|| StateValue::Array(Vec::new())),
        )
    });
    store.set_reducers("loaded_preset", |preset| {
        (
            "name_change".to_string(),
            preset
                .get("name_change_parameters")
                .cloned()
                .unwrap_or(StateValue::Null),
        )
    });

    let state = Rc::clone(editor);
    store.set_watcher("output_ext", move |value| {
        if let Some(ext) = value.as_str() {
            let mut state = state.borrow_mut();
            state.preset.ext = ext.to_string();
            state.refresh_destinations();
        }
    });

    let state = Rc::clone(editor);
    store.set_watcher("transformations", move |value| {
        if let Ok(transformations) = serde_json::from_value::<Vec<Transformation>>(value.clone()) {
            let mut state = state.borrow_mut();
            state.preset.transformations = transformations;
            state.rebuild_param_drafts();
        }
    });

    let state = Rc::clone(editor);
    store.set_watcher("name_change", move |value| {
        if let Ok(rule) = serde_json::from_value::<NameChangeParameters>(value.clone()) {
            let mut state = state.borrow_mut();
            state.preset.name_change_parameters = rule;
            state.refresh_destinations();
        }
    });
}

/// Dropped `.vst3` bundles register a plugin instead of joining the file list
fn is_plugin_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("vst3"))
}
