//! Backend records, their drafts and the non-CRUD response bodies.

pub mod academics;
pub mod announcements;
pub mod assessments;
pub mod people;

pub use academics::{
    Class, ClassDraft, ClassStreamSubject, ClassStreamSubjectDraft, RoleDraft, RoleRecord, Stream,
    StreamDraft, Subject, SubjectDraft,
};
pub use announcements::{
    Announcement, AnnouncementDraft, AnnouncementFeed, Audience, Total, TotalKind,
};
pub use assessments::{
    Cat, CatAndExam, CatAndExamDraft, CatDraft, CatGrade, CatGradeDraft, Exam, ExamDraft,
    ExamGrade, ExamGradeDraft,
};
pub use people::{
    AccountDraft, Admin, Parent, ParentDraft, Student, StudentDraft, Teacher, TeacherDraft,
    UserProfile,
};
