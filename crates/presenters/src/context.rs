use std::{sync::Arc, time::Duration};

use authoring_core::{
    quadrants::QuadrantDefaults, AuthoringSettings, DispatchService, EventBus, ServiceClient,
};
use url::Url;

use crate::{
    error::{PresenterError, PresenterResult},
    preview::PREVIEW_PAGE,
};

/// Everything a presenter shares with the rest of the editor session.
#[derive(Clone)]
pub struct AuthoringContext {
    pub client: ServiceClient,
    pub events: EventBus,
    pub course_folder_path: String,
    pub browser_session_key: String,
    pub read_only: bool,
    pub defaults: QuadrantDefaults,
    pub refresh_debounce: Duration,
    pub preview_page: Url,
}

impl AuthoringContext {
    pub fn from_settings(
        settings: &AuthoringSettings,
        service: Arc<dyn DispatchService>,
        events: EventBus,
    ) -> PresenterResult<Self> {
        let mut base = Url::parse(settings.server_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: ServiceClient::new(service, settings.username.clone()),
            events,
            course_folder_path: settings.course_folder_path.clone(),
            browser_session_key: settings.browser_session_key.clone(),
            read_only: settings.read_only,
            defaults: QuadrantDefaults::from(settings),
            refresh_debounce: settings.content_refresh_debounce(),
            preview_page: base.join(PREVIEW_PAGE)?,
        })
    }

    /// Refuses a change to `what` while the course is open read-only.
    pub fn ensure_writable(&self, what: &'static str) -> PresenterResult<()> {
        if self.read_only {
            return Err(PresenterError::ReadOnly { what });
        }
        Ok(())
    }

    /// Workspace path of a file relative to the course folder.
    pub fn course_file(&self, file: &str) -> String {
        format!("{}/{}", self.course_folder_path, file)
    }
}

#[cfg(test)]
mod tests {
    use authoring_core::MissingDispatchService;

    use super::*;

    #[test]
    fn preview_page_sits_next_to_server_root() {
        let settings = AuthoringSettings {
            server_url: "http://gift.local:8080/gat".into(),
            course_folder_path: "author/course".into(),
            ..AuthoringSettings::default()
        };
        let context =
            AuthoringContext::from_settings(&settings, Arc::new(MissingDispatchService), EventBus::new())
                .expect("context");

        assert_eq!(
            context.preview_page.as_str(),
            "http://gift.local:8080/gat/LessonMaterialPreview.html"
        );
        assert_eq!(context.course_file("a.dkf.xml"), "author/course/a.dkf.xml");
        assert_eq!(context.defaults.recall_allowed_attempts, 3);
    }

    #[test]
    fn malformed_server_url_is_rejected() {
        let settings = AuthoringSettings {
            server_url: "not a url".into(),
            ..AuthoringSettings::default()
        };
        assert!(
            AuthoringContext::from_settings(&settings, Arc::new(MissingDispatchService), EventBus::new())
                .is_err()
        );
    }
}
