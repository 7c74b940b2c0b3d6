//! Serializable types exchanged with clients and between the store and the core.

pub mod assignment_grade;
pub mod assignment_item;
pub mod login_object;
pub mod new_user_object;
pub mod request;
pub mod student_stats;
pub mod user_info;
pub mod validation_object;
