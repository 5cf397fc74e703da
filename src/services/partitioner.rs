//! Volunteer assignment
//!
//! Buckets are a pure function of import order and the policy parameter,
//! so re-running assignment over an unchanged sequence gives identical
//! results.

use std::num::NonZeroU32;

use crate::types::{volunteer_label, DynamicRecord, SurveyRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentPolicy {
    /// Contiguous runs of `batch_size` records per volunteer
    Chunked { batch_size: NonZeroU32 },
    /// Record `i` goes to volunteer `(i mod volunteer_count) + 1`
    RoundRobin { volunteer_count: NonZeroU32 },
}

impl AssignmentPolicy {
    /// 1-based bucket for the record at `index`.
    pub fn bucket_for(self, index: usize) -> u32 {
        match self {
            AssignmentPolicy::Chunked { batch_size } => {
                (index / batch_size.get() as usize) as u32 + 1
            }
            AssignmentPolicy::RoundRobin { volunteer_count } => {
                (index % volunteer_count.get() as usize) as u32 + 1
            }
        }
    }

    /// Number of non-empty buckets for `total` records.
    pub fn bucket_count(self, total: usize) -> usize {
        match self {
            AssignmentPolicy::Chunked { batch_size } => {
                total.div_ceil(batch_size.get() as usize)
            }
            AssignmentPolicy::RoundRobin { volunteer_count } => {
                total.min(volunteer_count.get() as usize)
            }
        }
    }
}

/// A record that carries a volunteer assignment.
pub trait Assignable {
    fn assign_volunteer(&mut self, bucket: u32);
}

impl Assignable for SurveyRecord {
    fn assign_volunteer(&mut self, bucket: u32) {
        self.volunteer_id = bucket;
    }
}

impl Assignable for DynamicRecord {
    fn assign_volunteer(&mut self, bucket: u32) {
        self.volunteer_id = volunteer_label(bucket);
    }
}

/// Assign every record a bucket by its position in `records`.
pub fn assign<R: Assignable>(mut records: Vec<R>, policy: AssignmentPolicy) -> Vec<R> {
    for (index, record) in records.iter_mut().enumerate() {
        record.assign_volunteer(policy.bucket_for(index));
    }
    records
}
