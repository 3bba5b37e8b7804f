//! Parameter-vector layouts used by the problems.

pub mod pose_rvec;
