//! Lesson material course object editor.

use shared::{
    domain::{Course, LessonMaterial, LessonMaterialList, Media, MediaTypeProperties},
    protocol::EditorEvent,
};
use tracing::{debug, info, warn};

use authoring_core::ServiceCallError;

use crate::{
    context::AuthoringContext,
    error::{service_notice, PresenterError, PresenterResult},
    preview::{self, MediaLocation, PARENT_PATH_MESSAGE},
    view::{ConceptChoice, LessonMaterialView, Notice},
};

pub const CONVERSION_FAILED_TITLE: &str = "Failed to Convert Lesson Material Files";
pub const CONVERSION_REJECTED_TITLE: &str = "Failed to Convert Lesson Material Reference Files";

pub struct LessonMaterialPresenter<V> {
    context: AuthoringContext,
    view: V,
    lesson_material: Option<LessonMaterial>,
    course: Course,
    course_folder_url: Option<String>,
}

impl<V: LessonMaterialView> LessonMaterialPresenter<V> {
    pub fn new(context: AuthoringContext, view: V) -> Self {
        Self {
            context,
            view,
            lesson_material: None,
            course: Course::default(),
            course_folder_url: None,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn lesson_material(&self) -> Option<&LessonMaterial> {
        self.lesson_material.as_ref()
    }

    /// Looks up where the course folder is served from for previews.
    pub async fn start(&mut self) {
        match self.context.client.domain_content_server_address().await {
            Ok(address) => {
                self.course_folder_url = Some(preview::course_folder_url(
                    &address,
                    &self.context.course_folder_path,
                ));
            }
            Err(err) => warn!("lesson material: domain content address unavailable: {err}"),
        }
    }

    pub async fn edit(&mut self, lesson_material: LessonMaterial, course: Course) {
        debug!(transition = ?lesson_material.transition_name, "lesson material: edit");
        let legacy_files = lesson_material.lesson_material_files.is_some();
        self.lesson_material = Some(lesson_material);
        self.course = course;
        self.populate().await;
        if legacy_files {
            // Conversion failures are already on screen.
            let _ = self.convert_legacy_files().await;
        }
    }

    async fn populate(&mut self) {
        self.view.set_read_only(self.context.read_only);
        let Some(lesson_material) = self.lesson_material.as_ref() else {
            return;
        };
        self.view.set_disabled(lesson_material.disabled);

        let media = lesson_material
            .lesson_material_list
            .as_ref()
            .map(|list| list.media.clone())
            .unwrap_or_default();
        let single = lesson_material
            .lesson_material_list
            .as_ref()
            .is_some_and(|list| list.is_collection == Some(false));

        let Some(first) = media.first() else {
            self.view.show_collection(&media);
            return;
        };
        match &first.properties {
            MediaTypeProperties::Lti { lti_concepts, .. } => {
                let mut names = self.course.concept_names();
                names.sort();
                let choices: Vec<ConceptChoice> = names
                    .into_iter()
                    .map(|name| ConceptChoice {
                        chosen: lti_concepts.contains(&name),
                        name,
                    })
                    .collect();
                self.view.set_lti_concepts(&choices);
                self.view.set_lti_providers(&self.course.lti_providers);
                self.view.show_media(first);
            }
            MediaTypeProperties::SlideShow { .. } => self.view.show_media(first),
            _ if single => self.view.show_media(first),
            _ => {
                self.view.show_collection(&media);
                if let Err(err) = self.check_media_files(&media).await {
                    warn!("lesson material: media validation failed: {err}");
                }
            }
        }
    }

    async fn check_media_files(&mut self, media: &[Media]) -> Result<(), ServiceCallError> {
        if media.is_empty() {
            return Ok(());
        }
        let results = self
            .context
            .client
            .workspace_files_exist(&self.context.course_folder_path, media.to_vec())
            .await?;
        self.view.set_media_validity(&results);
        Ok(())
    }

    /// Folds media from legacy lesson material files into the list.
    pub async fn convert_legacy_files(&mut self) -> PresenterResult<()> {
        let files = self
            .lesson_material
            .as_ref()
            .and_then(|lm| lm.lesson_material_files.clone())
            .ok_or(PresenterError::NotEditing)?;
        let file_items: String = files.iter().map(|file| format!("<li><b>{file}</b></li>")).collect();

        let converted = match self
            .context
            .client
            .convert_lesson_material_files(files.clone(), &self.context.course_folder_path)
            .await
        {
            Ok(converted) => converted,
            Err(err) => {
                let message = format!(
                    "An error occurred while extracting media from the following lesson material files:<ul>{file_items}</ul>\
                     As a result of this error, the media contained by these files cannot be displayed or edited through this interface.<br/><br/>\
                     You can still edit this transition and save any changes made to it; however, you will not be able to modify \
                     or remove any of the media within these files."
                );
                let title = match &err {
                    ServiceCallError::Rejected { error, .. } if error.details.is_some() => CONVERSION_REJECTED_TITLE,
                    ServiceCallError::Rejected { .. } => "Failed to convert lesson material reference files",
                    _ => CONVERSION_FAILED_TITLE,
                };
                self.view.notify(service_notice(title, &message, &err));
                return Err(PresenterError::service(title, err));
            }
        };

        let lesson_material = self.lesson_material.as_mut().ok_or(PresenterError::NotEditing)?;
        if let Some(converted) = converted {
            match lesson_material.lesson_material_list.as_mut() {
                Some(list) => list.media.extend(converted.media),
                None => lesson_material.lesson_material_list = Some(converted),
            }
        }
        lesson_material.lesson_material_files = None;
        info!(files = files.len(), "lesson material: legacy files converted");

        self.view.notify(Notice::info(
            "Lesson Material reference conversion",
            format!(
                "The following lesson material files were discovered while opening this transition for editing:<ul>{file_items}</ul>\
                 In order to allow the contents of these files to be edited through this interface, the media within these files has been extracted and placed in \
                 a single lesson material list for authoring.<br/><br/>This will have no effect on course execution.<br/><br/>\
                 Note that, once this course is saved, the references to these lesson material files will be removed from this transition, \
                 and the media within them will be added to the lesson material list."
            ),
        ));
        self.populate().await;
        Ok(())
    }

    pub fn set_disabled(&mut self, disabled: bool) -> PresenterResult<()> {
        self.context.ensure_writable("Lesson material")?;
        let lesson_material = self.lesson_material.as_mut().ok_or(PresenterError::NotEditing)?;
        lesson_material.disabled = disabled;
        let transition_name = lesson_material.transition_name.clone();
        self.context.events.publish(EditorEvent::EditorDirty);
        self.context
            .events
            .publish(EditorEvent::CourseObjectDisabled { transition_name });
        Ok(())
    }

    pub fn add_media(&mut self) -> PresenterResult<()> {
        self.context.ensure_writable("Lesson material")?;
        self.view.open_media_editor(None);
        Ok(())
    }

    pub fn edit_media(&mut self, index: usize) -> PresenterResult<()> {
        let media = self.media(index)?.clone();
        self.view.open_media_editor(Some((index, &media)));
        Ok(())
    }

    /// Media editor closed with `media`; `editing` is the index it replaces.
    pub async fn submit_media(&mut self, editing: Option<usize>, media: Media) -> PresenterResult<()> {
        self.context.ensure_writable("Lesson material")?;
        let lesson_material = self.lesson_material.as_mut().ok_or(PresenterError::NotEditing)?;
        let list = lesson_material
            .lesson_material_list
            .get_or_insert_with(LessonMaterialList::default);
        match editing {
            Some(index) if index < list.media.len() => list.media[index] = media,
            _ => list.media.push(media),
        }
        self.context.events.publish(EditorEvent::EditorDirty);
        self.populate().await;
        Ok(())
    }

    pub async fn delete_media(&mut self, index: usize) -> PresenterResult<()> {
        self.context.ensure_writable("Lesson material")?;
        let lesson_material = self.lesson_material.as_mut().ok_or(PresenterError::NotEditing)?;
        let Some(list) = lesson_material.lesson_material_list.as_mut() else {
            warn!("lesson material: delete requested without a media list");
            return Err(PresenterError::NotEditing);
        };
        if index >= list.media.len() {
            return Err(PresenterError::Rejected(format!("no media at position {index}")));
        }
        list.media.remove(index);
        let remaining = list.media.clone();
        if remaining.is_empty() {
            lesson_material.lesson_material_list = None;
        }
        self.view.show_collection(&remaining);
        // A failed check is reported by validate_media itself.
        let _ = self.validate_media(false).await;
        self.context.events.publish(EditorEvent::EditorDirty);
        Ok(())
    }

    /// Concepts an LTI provider teaches.
    pub fn set_lti_concepts(&mut self, selected: &[String]) -> PresenterResult<()> {
        self.context.ensure_writable("Lesson material")?;
        let changed = match &mut self.media_mut(0)?.properties {
            MediaTypeProperties::Lti { lti_concepts, .. } => {
                *lti_concepts = selected.to_vec();
                true
            }
            _ => false,
        };
        if changed {
            self.context.events.publish(EditorEvent::EditorDirty);
        }
        Ok(())
    }

    pub fn set_lti_provider(&mut self, provider: Option<String>) -> PresenterResult<()> {
        self.context.ensure_writable("Lesson material")?;
        let changed = match &mut self.media_mut(0)?.properties {
            MediaTypeProperties::Lti { provider_id, .. } => {
                *provider_id = provider;
                true
            }
            _ => false,
        };
        if changed {
            self.context.events.publish(EditorEvent::EditorDirty);
        }
        Ok(())
    }

    /// Checks that every media file still exists in the course folder.
    pub async fn validate_media(&mut self, notify: bool) -> PresenterResult<()> {
        let lesson_material = self.lesson_material.as_ref().ok_or(PresenterError::NotEditing)?;
        let name = lesson_material.transition_name.clone().unwrap_or_default();
        let media = lesson_material
            .lesson_material_list
            .as_ref()
            .map(|list| list.media.clone())
            .unwrap_or_default();
        if media.is_empty() {
            return Ok(());
        }
        if notify {
            self.view.notify(Notice::toast(format!("Validating media for {name}...")));
        }
        match self.check_media_files(&media).await {
            Ok(()) => {
                if notify {
                    self.view
                        .notify(Notice::toast(format!("Validation for {name} completed")));
                }
                Ok(())
            }
            Err(err) => {
                let title = "There was a problem validating the MediaCollection";
                self.view.notify(service_notice(title, "", &err));
                Err(PresenterError::service(title, err))
            }
        }
    }

    /// Opens a preview of one media item. `location` says whether a non-video
    /// uri points into the course folder or at the web.
    pub async fn preview_media(&mut self, index: usize, location: MediaLocation) -> PresenterResult<()> {
        let media = self.media(index)?.clone();
        if media.uri.is_empty() {
            self.view
                .notify(Notice::warning("URL Error", "Please provide a URL to preview."));
            return Err(PresenterError::Rejected("media has no uri".into()));
        }
        let page = &self.context.preview_page;
        let image = matches!(media.properties, MediaTypeProperties::Image);

        if let MediaTypeProperties::YoutubeVideo { size } = media.properties {
            let url = preview::youtube_preview(page, &media.uri, size);
            self.view.open_preview(url);
            return Ok(());
        }

        match location {
            MediaLocation::Web => {
                let url = preview::external_preview(page, &media.uri, image);
                self.view.open_preview(url);
                Ok(())
            }
            MediaLocation::CourseFolder => self.preview_course_file(&media.uri, image).await,
        }
    }

    async fn preview_course_file(&mut self, uri: &str, image: bool) -> PresenterResult<()> {
        if preview::escapes_course_folder(uri) {
            self.view.notify(Notice::warning("Invalid path", PARENT_PATH_MESSAGE));
            return Err(PresenterError::Rejected(PARENT_PATH_MESSAGE.into()));
        }

        let path = self.context.course_file(uri);
        match self.context.client.workspace_file_exists(&path).await {
            Ok(true) => {}
            Ok(false) => {
                let message = format!("The file '{uri}' could not be found in the course folder.");
                self.view.notify(Notice::warning("Preview Failed", message.clone()));
                return Err(PresenterError::Rejected(message));
            }
            Err(ServiceCallError::Rejected { error, .. }) => {
                self.view
                    .notify(Notice::warning("Preview Failed", error.message.clone()));
                return Err(PresenterError::Rejected(error.message));
            }
            Err(err) => {
                let title = "The server was unable to complete the check for the existence of the user defined uri";
                self.view.notify(service_notice(title, "", &err));
                return Err(PresenterError::service(title, err));
            }
        }

        if self.course_folder_url.is_none() {
            self.start().await;
        }
        let Some(folder_url) = self.course_folder_url.as_deref() else {
            let message = "The location of the course folder is not known yet.";
            self.view.notify(Notice::warning("Preview Failed", message));
            return Err(PresenterError::Rejected(message.into()));
        };
        let url = preview::course_folder_preview(&self.context.preview_page, folder_url, uri, image);
        self.view.open_preview(url);
        Ok(())
    }

    pub async fn handle_event(&mut self, event: &EditorEvent) {
        match event {
            EditorEvent::CourseConceptsChanged
            | EditorEvent::CourseLtiProvidersChanged
            | EditorEvent::CourseObjectRenamed { .. } => self.populate().await,
            EditorEvent::CourseFolderChanged { course_folder_path } => {
                self.context.course_folder_path = course_folder_path.clone();
                self.course_folder_url = None;
            }
            _ => {}
        }
    }

    /// Replaces the course the concept and provider lists come from. Call
    /// before forwarding a course change event.
    pub fn set_course(&mut self, course: Course) {
        self.course = course;
    }

    fn media(&self, index: usize) -> PresenterResult<&Media> {
        self.lesson_material
            .as_ref()
            .and_then(|lm| lm.lesson_material_list.as_ref())
            .and_then(|list| list.media.get(index))
            .ok_or_else(|| PresenterError::Rejected(format!("no media at position {index}")))
    }

    fn media_mut(&mut self, index: usize) -> PresenterResult<&mut Media> {
        self.lesson_material
            .as_mut()
            .and_then(|lm| lm.lesson_material_list.as_mut())
            .and_then(|list| list.media.get_mut(index))
            .ok_or_else(|| PresenterError::Rejected(format!("no media at position {index}")))
    }
}

#[cfg(test)]
#[path = "tests/lesson_material_tests.rs"]
mod tests;
