//! Preview addresses for lesson material media.

use shared::domain::Size;
use url::Url;

pub const PREVIEW_PAGE: &str = "LessonMaterialPreview.html";

const DEFAULT_PREVIEW_WIDTH: &str = "81%";
const DEFAULT_PREVIEW_HEIGHT: &str = "95%";
const YOUTUBE_EMBED: &str = "https://www.youtube.com/embed/";
const YOUTUBE_ID_LEN: usize = 11;

/// Where a non-video media uri points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaLocation {
    CourseFolder,
    Web,
}

pub const PARENT_PATH_MESSAGE: &str = "The URI must reference a course within the course folder.\nThe uri cannot contain any use of the '..' operator.";

/// True when a course-folder relative uri climbs out of the folder.
pub fn escapes_course_folder(uri: &str) -> bool {
    uri == ".." || uri.ends_with("/..") || uri.starts_with("../") || uri.contains("/../")
}

/// Rewrites a YouTube watch or short link into its embeddable form.
pub fn embedded_youtube_url(uri: &str) -> String {
    let mut url = uri.to_string();
    if !url.contains("/embed/") {
        if url.contains("youtu.be") {
            url = url.replace("youtu.be/", "www.youtube.com/embed/");
        } else if let Some(id_start) = video_id_start(&url) {
            url = format!("{YOUTUBE_EMBED}{}", &url[id_start..]);
        }
    }
    with_scheme(url)
}

/// Byte offset of the video id in a `...v=<id>` link. The `v=` must be the
/// first `v` in the link and at least a full id has to follow it.
fn video_id_start(url: &str) -> Option<usize> {
    let v = url.find('v')?;
    if v == 0 || !url[v..].starts_with("v=") {
        return None;
    }
    let start = v + 2;
    (url[start..].chars().count() >= YOUTUBE_ID_LEN).then_some(start)
}

fn with_scheme(url: String) -> String {
    if url.contains("http") {
        url
    } else {
        format!("http://{url}")
    }
}

pub fn youtube_preview(page: &Url, uri: &str, size: Option<Size>) -> Url {
    let (width, height) = match size {
        Some(size) => (format!("{}px", size.width), format!("{}px", size.height)),
        None => (DEFAULT_PREVIEW_WIDTH.to_string(), DEFAULT_PREVIEW_HEIGHT.to_string()),
    };
    let mut url = page.clone();
    url.query_pairs_mut()
        .append_pair("url", &embedded_youtube_url(uri))
        .append_pair("height", &height)
        .append_pair("width", &width);
    url
}

/// Preview of a file that lives in the course folder on the domain content
/// server.
pub fn course_folder_preview(page: &Url, course_folder_url: &str, uri: &str, image: bool) -> Url {
    let mut url = page.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("courseFolder", course_folder_url)
            .append_pair("url", uri);
        if image {
            query.append_pair("image", "true");
        }
    }
    url
}

pub fn external_preview(page: &Url, uri: &str, image: bool) -> Url {
    let mut url = page.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("url", &with_scheme(uri.to_string()));
        if image {
            query.append_pair("image", "true");
        }
    }
    url
}

/// Address of the course folder on the domain content server.
pub fn course_folder_url(domain_address: &str, course_folder_path: &str) -> String {
    format!("{domain_address}/workspace/{course_folder_path}")
}
