use shared::{
    domain::{CourseConcepts, LtiProvider, Size},
    protocol::{GatAction, GatResult},
};

use super::*;
use crate::test_support::{context, drain, FakeService, LessonMaterialRecorder};

fn media(name: &str, uri: &str, properties: MediaTypeProperties) -> Media {
    Media {
        name: name.into(),
        uri: uri.into(),
        properties,
    }
}

fn collection(media: Vec<Media>) -> LessonMaterial {
    LessonMaterial {
        transition_name: Some("Intro".into()),
        lesson_material_list: Some(LessonMaterialList {
            is_collection: Some(true),
            media,
        }),
        ..LessonMaterial::default()
    }
}

fn presenter(
    service: std::sync::Arc<FakeService>,
    read_only: bool,
) -> (
    LessonMaterialPresenter<LessonMaterialRecorder>,
    tokio::sync::broadcast::Receiver<EditorEvent>,
) {
    let (context, events) = context(service, read_only);
    (
        LessonMaterialPresenter::new(context, LessonMaterialRecorder::default()),
        events,
    )
}

#[tokio::test]
async fn collection_is_listed_and_checked() {
    let service = FakeService::new();
    let (mut presenter, _events) = presenter(service.clone(), false);

    presenter
        .edit(
            collection(vec![media("a", "a.pdf", MediaTypeProperties::Pdf)]),
            Course::default(),
        )
        .await;

    let view = presenter.view();
    assert_eq!(view.collection.as_ref().map(Vec::len), Some(1));
    assert!(view.single.is_none());
    assert!(view.validity.is_some());
    assert_eq!(service.names(), vec!["workspace_files_exist"]);
}

#[tokio::test]
async fn lti_media_shows_sorted_concepts() {
    let service = FakeService::new();
    let (mut presenter, _events) = presenter(service.clone(), false);
    let course = Course {
        concepts: Some(CourseConcepts::List(vec!["zulu".into(), "alpha".into()])),
        lti_providers: vec![LtiProvider {
            identifier: "provider".into(),
            key: None,
        }],
        ..Course::default()
    };
    let lti = media(
        "tool",
        "https://lti.example/launch",
        MediaTypeProperties::Lti {
            provider_id: Some("provider".into()),
            lti_concepts: vec!["zulu".into()],
        },
    );

    presenter.edit(collection(vec![lti]), course).await;

    let view = presenter.view();
    assert_eq!(
        view.lti_concepts,
        vec![
            ConceptChoice {
                name: "alpha".into(),
                chosen: false
            },
            ConceptChoice {
                name: "zulu".into(),
                chosen: true
            },
        ]
    );
    assert_eq!(view.lti_providers.len(), 1);
    assert!(view.single.is_some());
    assert!(service.names().is_empty());
}

#[tokio::test]
async fn legacy_files_are_folded_into_the_list() {
    let service = FakeService::new();
    service.respond("convert_lesson_material_files", |_| {
        Ok(GatResult::LessonMaterialConverted {
            list: Some(LessonMaterialList {
                is_collection: Some(true),
                media: vec![Media {
                    name: "old".into(),
                    uri: "old.html".into(),
                    properties: MediaTypeProperties::WebPage,
                }],
            }),
        })
    });
    let (mut presenter, _events) = presenter(service.clone(), false);
    let mut lesson_material = collection(vec![media("a", "a.pdf", MediaTypeProperties::Pdf)]);
    lesson_material.lesson_material_files = Some(vec!["legacy.lessonMaterial.xml".into()]);

    presenter.edit(lesson_material, Course::default()).await;

    let edited = presenter.lesson_material().expect("editing");
    assert!(edited.lesson_material_files.is_none());
    assert_eq!(
        edited.lesson_material_list.as_ref().map(|list| list.media.len()),
        Some(2)
    );
    assert_eq!(
        presenter.view().notices.last().and_then(Notice::title),
        Some("Lesson Material reference conversion")
    );
    assert_eq!(presenter.view().collection.as_ref().map(Vec::len), Some(2));
}

#[tokio::test]
async fn failed_conversion_keeps_the_legacy_files() {
    let service = FakeService::new();
    service.fail("convert_lesson_material_files");
    let (mut presenter, _events) = presenter(service, false);
    let mut lesson_material = collection(Vec::new());
    lesson_material.lesson_material_files = Some(vec!["legacy.lessonMaterial.xml".into()]);

    presenter.edit(lesson_material, Course::default()).await;

    assert!(presenter
        .lesson_material()
        .and_then(|lm| lm.lesson_material_files.as_ref())
        .is_some());
    let notice = presenter.view().notices.last().expect("notice");
    assert_eq!(notice.title(), Some(CONVERSION_FAILED_TITLE));
    assert!(notice.message().contains("legacy.lessonMaterial.xml"));
}

#[tokio::test]
async fn deleting_the_last_media_clears_the_list() {
    let service = FakeService::new();
    let (mut presenter, mut events) = presenter(service, false);
    presenter
        .edit(
            collection(vec![media("a", "a.pdf", MediaTypeProperties::Pdf)]),
            Course::default(),
        )
        .await;

    presenter.delete_media(0).await.expect("deleted");

    assert!(presenter
        .lesson_material()
        .expect("editing")
        .lesson_material_list
        .is_none());
    assert_eq!(presenter.view().collection, Some(Vec::new()));
    assert!(drain(&mut events).contains(&EditorEvent::EditorDirty));
    assert!(presenter.delete_media(0).await.is_err());
}

#[tokio::test]
async fn submitted_media_replaces_or_appends() {
    let service = FakeService::new();
    let (mut presenter, _events) = presenter(service, false);
    presenter
        .edit(
            collection(vec![media("a", "a.pdf", MediaTypeProperties::Pdf)]),
            Course::default(),
        )
        .await;

    presenter
        .submit_media(Some(0), media("b", "b.pdf", MediaTypeProperties::Pdf))
        .await
        .expect("replaced");
    presenter
        .submit_media(None, media("c", "c.png", MediaTypeProperties::Image))
        .await
        .expect("appended");

    let names: Vec<_> = presenter
        .lesson_material()
        .and_then(|lm| lm.lesson_material_list.as_ref())
        .map(|list| list.media.iter().map(|m| m.name.clone()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["b", "c"]);
}

#[tokio::test]
async fn read_only_refuses_new_media() {
    let (mut presenter, _events) = presenter(FakeService::new(), true);
    presenter.edit(collection(Vec::new()), Course::default()).await;

    assert!(matches!(
        presenter.add_media(),
        Err(PresenterError::ReadOnly { .. })
    ));
    assert!(presenter.view().editor_opened.is_empty());
    assert_eq!(presenter.view().read_only, Some(true));
}

#[tokio::test]
async fn preview_rejects_paths_outside_the_course_folder() {
    let service = FakeService::new();
    let (mut presenter, _events) = presenter(service.clone(), false);
    presenter
        .edit(
            collection(vec![media("a", "../other/a.pdf", MediaTypeProperties::Pdf)]),
            Course::default(),
        )
        .await;

    let result = presenter.preview_media(0, MediaLocation::CourseFolder).await;

    assert!(result.is_err());
    assert_eq!(
        presenter.view().notices.last().and_then(Notice::title),
        Some("Invalid path")
    );
    assert_eq!(service.count("workspace_file_exists"), 0);
}

#[tokio::test]
async fn preview_of_course_file_checks_existence() {
    let service = FakeService::new();
    let (mut presenter, _events) = presenter(service.clone(), false);
    presenter
        .edit(
            collection(vec![media("pic", "images/pic.png", MediaTypeProperties::Image)]),
            Course::default(),
        )
        .await;

    presenter
        .preview_media(0, MediaLocation::CourseFolder)
        .await
        .expect("previewed");

    let url = presenter.view().previews.last().expect("preview").clone();
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(query.contains(&(
        "courseFolder".into(),
        "http://gift.local:8885/workspace/author/course".into()
    )));
    assert!(query.contains(&("url".into(), "images/pic.png".into())));
    assert!(query.contains(&("image".into(), "true".into())));
    let checked = service.actions().into_iter().any(|action| {
        matches!(action, GatAction::WorkspaceFileExists { path, .. } if path == "author/course/images/pic.png")
    });
    assert!(checked);
}

#[tokio::test]
async fn preview_of_missing_file_warns() {
    let service = FakeService::new();
    service.respond("workspace_file_exists", |_| {
        Ok(GatResult::FilesExist {
            results: Default::default(),
        })
    });
    let (mut presenter, _events) = presenter(service, false);
    presenter
        .edit(
            collection(vec![media("a", "a.pdf", MediaTypeProperties::Pdf)]),
            Course::default(),
        )
        .await;

    assert!(presenter
        .preview_media(0, MediaLocation::CourseFolder)
        .await
        .is_err());
    assert_eq!(
        presenter.view().notices.last(),
        Some(&Notice::warning(
            "Preview Failed",
            "The file 'a.pdf' could not be found in the course folder."
        ))
    );
    assert!(presenter.view().previews.is_empty());
}

#[tokio::test]
async fn youtube_preview_uses_embed_url() {
    let (mut presenter, _events) = presenter(FakeService::new(), false);
    presenter
        .edit(
            collection(vec![media(
                "clip",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                MediaTypeProperties::YoutubeVideo {
                    size: Some(Size {
                        width: 640,
                        height: 360,
                    }),
                },
            )]),
            Course::default(),
        )
        .await;

    presenter
        .preview_media(0, MediaLocation::Web)
        .await
        .expect("previewed");

    let url = presenter.view().previews.last().expect("preview").clone();
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(query.contains(&("url".into(), "https://www.youtube.com/embed/dQw4w9WgXcQ".into())));
    assert!(query.contains(&("height".into(), "360px".into())));
}

#[tokio::test]
async fn disabling_publishes_events() {
    let (mut presenter, mut events) = presenter(FakeService::new(), false);
    presenter.edit(collection(Vec::new()), Course::default()).await;

    presenter.set_disabled(true).expect("disabled");

    assert_eq!(
        drain(&mut events),
        vec![
            EditorEvent::EditorDirty,
            EditorEvent::CourseObjectDisabled {
                transition_name: Some("Intro".into())
            },
        ]
    );
}

#[tokio::test]
async fn folder_change_resets_preview_location() {
    let service = FakeService::new();
    let (mut presenter, _events) = presenter(service.clone(), false);
    presenter.start().await;
    presenter
        .handle_event(&EditorEvent::CourseFolderChanged {
            course_folder_path: "author/renamed".into(),
        })
        .await;
    presenter
        .edit(
            collection(vec![media("a", "a.pdf", MediaTypeProperties::Pdf)]),
            Course::default(),
        )
        .await;

    presenter
        .preview_media(0, MediaLocation::CourseFolder)
        .await
        .expect("previewed");

    assert_eq!(service.count("fetch_domain_content_server_address"), 2);
    let url = presenter.view().previews.last().expect("preview").clone();
    assert!(url.as_str().contains("author%2Frenamed"));
}

#[tokio::test]
async fn read_only_list_cannot_be_changed() {
    let service = FakeService::new();
    let (mut presenter, mut events) = presenter(service, true);
    presenter
        .edit(
            collection(vec![media("a", "a.pdf", MediaTypeProperties::Pdf)]),
            Course::default(),
        )
        .await;
    let before = presenter.lesson_material().cloned();
    drain(&mut events);

    assert!(matches!(
        presenter.delete_media(0).await,
        Err(PresenterError::ReadOnly { .. })
    ));
    assert!(presenter
        .submit_media(None, media("b", "b.pdf", MediaTypeProperties::Pdf))
        .await
        .is_err());
    assert!(presenter.set_disabled(true).is_err());
    assert!(presenter.set_lti_provider(Some("provider".into())).is_err());

    assert_eq!(presenter.lesson_material().cloned(), before);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn recheck_after_delete_stays_quiet() {
    let service = FakeService::new();
    let (mut presenter, _events) = presenter(service.clone(), false);
    presenter
        .edit(
            collection(vec![
                media("a", "a.pdf", MediaTypeProperties::Pdf),
                media("b", "b.pdf", MediaTypeProperties::Pdf),
            ]),
            Course::default(),
        )
        .await;
    let notices = presenter.view().notices.len();
    let checks = service.count("workspace_files_exist");

    presenter.delete_media(0).await.expect("deleted");

    assert_eq!(service.count("workspace_files_exist"), checks + 1);
    assert_eq!(presenter.view().notices.len(), notices);

    presenter.validate_media(true).await.expect("validated");
    assert_eq!(
        presenter.view().notices.last(),
        Some(&Notice::toast("Validation for Intro completed"))
    );
}
