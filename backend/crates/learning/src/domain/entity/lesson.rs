//! Lesson Entity

use chrono::{DateTime, Utc};
use kernel::id::{CourseId, LessonId};

use crate::error::{LearningError, LearningResult};

pub const LESSON_TITLE_MAX_LENGTH: usize = 200;
pub const VIDEO_URL_MAX_LENGTH: usize = 500;

/// Editable fields of a lesson
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    pub duration_minutes: i32,
    /// Readable without enrollment
    pub is_preview: bool,
}

impl LessonDraft {
    pub fn normalized(self) -> LearningResult<Self> {
        let title = self.title.trim().to_string();
        if title.is_empty() || title.chars().count() > LESSON_TITLE_MAX_LENGTH {
            return Err(LearningError::Validation(format!(
                "Lesson title must be 1..={} characters",
                LESSON_TITLE_MAX_LENGTH
            )));
        }

        let video_url = self
            .video_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        if let Some(url) = &video_url
            && (url.len() > VIDEO_URL_MAX_LENGTH
                || !(url.starts_with("https://") || url.starts_with("http://")))
        {
            return Err(LearningError::Validation(
                "Video URL must be an http(s) link of at most 500 characters".to_string(),
            ));
        }

        if self.duration_minutes < 0 {
            return Err(LearningError::Validation(
                "Duration cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            title,
            content: self.content,
            video_url,
            duration_minutes: self.duration_minutes,
            is_preview: self.is_preview,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub video_url: Option<String>,
    /// 1-based, contiguous within a course
    pub position: i32,
    pub duration_minutes: i32,
    pub is_preview: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn new(
        course_id: CourseId,
        draft: LessonDraft,
        position: i32,
        now: DateTime<Utc>,
    ) -> LearningResult<Self> {
        let draft = draft.normalized()?;
        Ok(Self {
            lesson_id: LessonId::new(),
            course_id,
            title: draft.title,
            content: draft.content,
            video_url: draft.video_url,
            position,
            duration_minutes: draft.duration_minutes,
            is_preview: draft.is_preview,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&mut self, draft: LessonDraft, now: DateTime<Utc>) -> LearningResult<()> {
        let draft = draft.normalized()?;
        self.title = draft.title;
        self.content = draft.content;
        self.video_url = draft.video_url;
        self.duration_minutes = draft.duration_minutes;
        self.is_preview = draft.is_preview;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> LessonDraft {
        LessonDraft {
            title: " Borrowing ".to_string(),
            content: "References are pointers with rules.".to_string(),
            video_url: Some(" https://video.example.com/1 ".to_string()),
            duration_minutes: 12,
            is_preview: false,
        }
    }

    #[test]
    fn test_new_lesson() {
        let lesson = Lesson::new(CourseId::new(), draft(), 3, Utc::now()).unwrap();
        assert_eq!(lesson.title, "Borrowing");
        assert_eq!(lesson.position, 3);
        assert_eq!(lesson.video_url.as_deref(), Some("https://video.example.com/1"));
    }

    #[test]
    fn test_draft_validation() {
        let blank_url = LessonDraft {
            video_url: Some("  ".to_string()),
            ..draft()
        };
        assert_eq!(blank_url.normalized().unwrap().video_url, None);

        let bad_url = LessonDraft {
            video_url: Some("ftp://video".to_string()),
            ..draft()
        };
        assert!(bad_url.normalized().is_err());

        let no_title = LessonDraft {
            title: String::new(),
            ..draft()
        };
        assert!(no_title.normalized().is_err());

        let negative = LessonDraft {
            duration_minutes: -5,
            ..draft()
        };
        assert!(negative.normalized().is_err());
    }
}
