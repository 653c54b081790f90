//! Training application course object editor.

use shared::{
    domain::{
        Course, Guidance, MediaSemantics, ShowAvatarInitially, TrainingAppRemediation,
        TrainingApplication, TRAINING_APP_STOPPED_STATE,
    },
    protocol::EditorEvent,
};
use tracing::{debug, info, warn};

use authoring_core::ServiceCallError;

use crate::{
    context::AuthoringContext,
    error::{service_notice, PresenterError, PresenterResult},
    view::{DkfRemoval, Notice, TrainingAppControls, TrainingAppView},
};

pub const SELECT_AGENT_LABEL: &str = "Select Agent";
pub const MEDIA_SEMANTICS_CONVERTED_MESSAGE: &str =
    "The Media Semantics character file was successfully converted to a GIFT compatible version";

pub struct TrainingAppPresenter<V> {
    context: AuthoringContext,
    view: V,
    app: Option<TrainingApplication>,
    course: Course,
}

impl<V: TrainingAppView> TrainingAppPresenter<V> {
    pub fn new(context: AuthoringContext, view: V) -> Self {
        Self {
            context,
            view,
            app: None,
            course: Course::default(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn training_app(&self) -> Option<&TrainingApplication> {
        self.app.as_ref()
    }

    pub async fn edit(&mut self, app: TrainingApplication, course: Course) {
        debug!(transition = ?app.transition_name, "training app: edit");
        self.app = Some(app);
        self.course = course;
        self.populate().await;
    }

    async fn populate(&mut self) {
        self.view.set_read_only(self.context.read_only);
        let Some(app) = self.app.as_mut() else {
            return;
        };
        app.finished_when
            .get_or_insert_with(|| TRAINING_APP_STOPPED_STATE.to_string());

        let options = app.options.clone().unwrap_or_default();
        let avatar = options
            .show_avatar_initially
            .as_ref()
            .and_then(|show| show.avatar_choice.as_ref())
            .and_then(|choice| choice.avatar.clone());
        let guidance = app.guidance.clone();

        self.view.set_controls(TrainingAppControls {
            full_screen: options.full_screen.unwrap_or(false),
            disabled: options.disabled.unwrap_or(false),
            disable_inst_inter_impl: options.disable_inst_inter_impl.unwrap_or(false),
            show_avatar: options.show_avatar_initially.is_some(),
        });
        self.view
            .set_avatar_label(avatar.as_deref().unwrap_or(SELECT_AGENT_LABEL));
        self.view.set_guidance(guidance.as_ref());
        self.refresh_remediation().await;
    }

    fn app_mut(&mut self) -> PresenterResult<&mut TrainingApplication> {
        self.app.as_mut().ok_or(PresenterError::NotEditing)
    }

    fn editable(&mut self) -> PresenterResult<&mut TrainingApplication> {
        self.context.ensure_writable("Training application")?;
        self.app_mut()
    }

    fn dirty(&self) {
        self.context.events.publish(EditorEvent::EditorDirty);
    }

    pub fn set_full_screen(&mut self, full_screen: bool) -> PresenterResult<()> {
        self.editable()?.options_mut().full_screen = Some(full_screen);
        self.dirty();
        Ok(())
    }

    pub fn set_disabled(&mut self, disabled: bool) -> PresenterResult<()> {
        let app = self.editable()?;
        app.options_mut().disabled = Some(disabled);
        let transition_name = app.transition_name.clone();
        self.dirty();
        self.context
            .events
            .publish(EditorEvent::CourseObjectDisabled { transition_name });
        Ok(())
    }

    pub fn set_disable_inst_inter_impl(&mut self, disable: bool) -> PresenterResult<()> {
        self.editable()?.options_mut().disable_inst_inter_impl = Some(disable);
        self.dirty();
        Ok(())
    }

    pub fn set_show_avatar(&mut self, show: bool) -> PresenterResult<()> {
        self.editable()?.options_mut().show_avatar_initially =
            show.then(ShowAvatarInitially::default);
        self.dirty();
        Ok(())
    }

    pub fn remove_avatar(&mut self) -> PresenterResult<()> {
        if let Some(show) = self.editable()?.options_mut().show_avatar_initially.as_mut() {
            show.avatar_choice = None;
        }
        self.view.set_avatar_label(SELECT_AGENT_LABEL);
        self.dirty();
        Ok(())
    }

    /// Author picked a Media Semantics character file from the course folder.
    pub async fn choose_avatar(&mut self, file: &str) -> PresenterResult<()> {
        let options = self.editable()?.options_mut();
        options
            .show_avatar_initially
            .get_or_insert_with(ShowAvatarInitially::default)
            .avatar_choice = Some(MediaSemantics {
            avatar: Some(file.to_string()),
        });
        self.view.set_avatar_label(file);
        let validated = self.validate_media_semantics(file, false).await;
        self.dirty();
        validated
    }

    /// Checks the character file and, if the author agrees, has the server
    /// rewrite an incompatible one.
    pub async fn validate_media_semantics(&mut self, file: &str, update: bool) -> PresenterResult<()> {
        if update {
            self.context.ensure_writable("Media Semantics file")?;
        }
        let path = self.context.course_file(file);
        let mut update = update;
        loop {
            let valid = match self.context.client.validate_media_semantics(&path, update).await {
                Ok(valid) => valid,
                Err(err @ ServiceCallError::Rejected { .. }) => {
                    let title = "An Error Occurred";
                    self.view.notify(service_notice(title, "", &err));
                    return Err(PresenterError::service(title, err));
                }
                Err(err) => {
                    let title = "Failed to validate";
                    self.view.notify(Notice::warning(
                        title,
                        format!("The server threw an exception while validating the media semantics file.\n{err}"),
                    ));
                    return Err(PresenterError::service(title, err));
                }
            };

            if update {
                info!(file, "training app: media semantics file converted");
                self.view.notify(Notice::toast(MEDIA_SEMANTICS_CONVERTED_MESSAGE));
                return Ok(());
            }
            if valid {
                return Ok(());
            }
            let convert = self.view.confirm(
                "Incompatible File",
                "The file you selected is not compatible with GIFT. As a result, this agent may not work correctly during the course.<br/>\
                 Would you like to update the file to be compatible with GIFT?",
            );
            if !convert || self.context.read_only {
                return Ok(());
            }
            update = true;
        }
    }

    pub async fn add_remediation(&mut self) -> PresenterResult<()> {
        self.editable()?
            .options_mut()
            .remediation
            .get_or_insert_with(TrainingAppRemediation::default);
        self.dirty();
        self.refresh_remediation().await;
        Ok(())
    }

    pub async fn delete_remediation(&mut self) -> PresenterResult<()> {
        self.editable()?.options_mut().remediation = None;
        self.dirty();
        self.refresh_remediation().await;
        Ok(())
    }

    /// Shows the remediation panel with the course concepts the linked
    /// scenario actually assesses.
    pub async fn refresh_remediation(&mut self) {
        let Some(app) = self.app.as_ref() else {
            return;
        };
        let remediation = app.remediation().cloned();
        let concepts = self.course.concept_names();
        let dkf = app.dkf_ref.as_ref().map(|dkf| dkf.file.clone());

        let Some(dkf) = dkf.filter(|_| !concepts.is_empty()) else {
            self.view.set_remediation(remediation.as_ref(), None, true);
            return;
        };

        self.view.set_remediation(remediation.as_ref(), None, false);
        let dkf_path = self.context.course_file(&dkf);
        match self.context.client.scenario_concepts(&dkf_path, concepts).await {
            Ok(scenario_concepts) => {
                self.view
                    .set_remediation(remediation.as_ref(), Some(&scenario_concepts), true)
            }
            Err(err) => {
                warn!(dkf = %dkf_path, "training app: scenario concepts unavailable: {err}");
                self.view.set_remediation(remediation.as_ref(), None, true);
            }
        }
    }

    pub fn set_remediation_concepts(&mut self, concepts: Vec<String>) -> PresenterResult<()> {
        if let Some(remediation) = self.editable()?.options_mut().remediation.as_mut() {
            remediation.concepts = concepts;
            self.dirty();
        }
        Ok(())
    }

    pub fn set_remediation_attempts(&mut self, attempts: Option<u32>) -> PresenterResult<()> {
        if let Some(remediation) = self.editable()?.options_mut().remediation.as_mut() {
            remediation.allowed_attempts = attempts;
            self.dirty();
        }
        Ok(())
    }

    /// Guidance shown before the application starts; `None` removes it.
    pub fn set_guidance(&mut self, guidance: Option<Guidance>) -> PresenterResult<()> {
        let app = self.editable()?;
        let name = app.transition_name.clone().unwrap_or_default();
        app.guidance = guidance.map(|mut guidance| {
            guidance.transition_name = Some(format!("{name} - Guidance"));
            guidance
        });
        self.dirty();
        Ok(())
    }

    /// Drops the application type so the author can pick another one. A
    /// linked real-time assessment is unlinked or deleted first.
    pub async fn change_application(&mut self) -> PresenterResult<()> {
        self.context.ensure_writable("Training application")?;
        let dkf = self
            .app
            .as_ref()
            .ok_or(PresenterError::NotEditing)?
            .dkf_ref
            .as_ref()
            .map(|dkf| dkf.file.clone())
            .filter(|file| !file.trim().is_empty());

        let mut outcome = Ok(());
        if let Some(dkf) = dkf {
            match self.view.ask_dkf_removal(&dkf) {
                None => return Ok(()),
                Some(DkfRemoval::Unlink) => {
                    info!(dkf = %dkf, "training app: unlinking real time assessment");
                    self.app_mut()?.dkf_ref = None;
                }
                Some(DkfRemoval::DeleteFile) => {
                    let path = self.context.course_file(&dkf);
                    info!(dkf = %path, "training app: deleting real time assessment");
                    let deleted = self
                        .context
                        .client
                        .delete_workspace_files(&self.context.browser_session_key, vec![path], true)
                        .await;
                    match deleted {
                        Ok(()) => self.app_mut()?.dkf_ref = None,
                        Err(err) => {
                            let title = "Deletion Failed";
                            self.view.notify(service_notice(
                                title,
                                "Failed to delete the real time assessment file.",
                                &err,
                            ));
                            outcome = Err(PresenterError::service(title, err));
                        }
                    }
                }
            }
        }

        let app = self.app_mut()?;
        app.app_type = None;
        app.interops = None;
        let transition_name = app.transition_name.clone();
        self.populate().await;
        self.context
            .events
            .publish(EditorEvent::CourseObjectRedraw { transition_name });
        outcome
    }

    pub async fn handle_event(&mut self, event: &EditorEvent) {
        match event {
            EditorEvent::CourseFolderChanged { course_folder_path } => {
                self.context.course_folder_path = course_folder_path.clone();
            }
            EditorEvent::CourseConceptsChanged | EditorEvent::ScenarioSaved { .. } => {
                self.refresh_remediation().await
            }
            _ => {}
        }
    }

    /// Replaces the course whose concepts remediation can target.
    pub fn set_course(&mut self, course: Course) {
        self.course = course;
    }
}

#[cfg(test)]
#[path = "tests/training_app_tests.rs"]
mod tests;
