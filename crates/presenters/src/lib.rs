//! Presenters for the lesson material, adaptive courseflow and training
//! application editors. Each presenter owns one course object and a view,
//! turns view events into model edits and service calls, and pushes the
//! result back to the view.

pub mod context;
pub mod error;
pub mod lesson_material;
pub mod mbp;
pub mod preview;
pub mod training_app;
pub mod view;

pub use context::AuthoringContext;
pub use error::{PresenterError, PresenterResult};
pub use lesson_material::LessonMaterialPresenter;
pub use mbp::MbpPresenter;
pub use training_app::TrainingAppPresenter;
pub use view::{LessonMaterialView, MbpView, Notice, TrainingAppView};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
