pub mod ranking;
pub use ranking::{Podium, RankedMember};

pub mod sample_data;
pub use sample_data::{SampleDataSummary, generate_sample_data};

pub mod tracker_service;
pub mod tracker_service_impl;
pub use tracker_service::{
    DashboardSummary, Leaderboard, MemberDetail, MemberRankings, TaskDraft, TaskWithOwner,
    TrackerError, TrackerService,
};
pub use tracker_service_impl::SeaOrmTrackerService;

pub mod validation;
