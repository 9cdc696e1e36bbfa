//! Offline repair of derived references
//!
//! Projects and like rows are authoritative. Every user's `ownProjects`,
//! `watchList`, `appliedProjects` and `participatingProjects` and every
//! project's `likeCount` are recomputed from them; only documents that
//! drifted are written back.

use common::error::DatabaseResult;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    models::{Project, ProjectMembership, UserLinks},
    repositories::Repositories,
};

const PAGE_SIZE: u64 = 100;

/// Documents rewritten by one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub users_repaired: u64,
    pub projects_repaired: u64,
}

#[derive(Clone)]
pub struct Reconciler {
    repos: Repositories,
}

impl Reconciler {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn all_projects(&self) -> DatabaseResult<Vec<Project>> {
        let mut projects = Vec::new();
        let mut skip = 0;
        loop {
            let page = self.repos.projects.find_page(skip, PAGE_SIZE).await?;
            let fetched = page.len() as u64;
            projects.extend(page);
            if fetched < PAGE_SIZE {
                return Ok(projects);
            }
            skip += fetched;
        }
    }

    pub async fn run(&self) -> DatabaseResult<ReconcileReport> {
        let projects = self.all_projects().await?;
        let project_ids: HashSet<Uuid> = projects.iter().map(|p| p.id).collect();

        let mut expected: HashMap<Uuid, UserLinks> = HashMap::new();
        for project in &projects {
            expected
                .entry(project.created_by)
                .or_default()
                .own_projects
                .push(project.id);
            for applicant in &project.applicants {
                expected
                    .entry(applicant.user_id)
                    .or_default()
                    .applied_projects
                    .push(ProjectMembership {
                        project_id: project.id,
                        role: applicant.role,
                    });
            }
            for participant in &project.participants {
                expected
                    .entry(participant.user_id)
                    .or_default()
                    .participating_projects
                    .push(ProjectMembership {
                        project_id: project.id,
                        role: participant.role,
                    });
            }
        }

        let mut like_counts: HashMap<Uuid, i64> = HashMap::new();
        for like in self.repos.likes.list_all().await? {
            if !project_ids.contains(&like.project_id) {
                warn!(
                    "Like {} points at missing project {}",
                    like.id, like.project_id
                );
                continue;
            }
            *like_counts.entry(like.project_id).or_default() += 1;
            expected
                .entry(like.user_id)
                .or_default()
                .watch_list
                .push(like.project_id);
        }

        let mut report = ReconcileReport::default();

        for user_id in self.repos.users.list_ids().await? {
            let Some(user) = self.repos.users.find_by_id(user_id).await? else {
                continue;
            };
            let links = expected.remove(&user_id).unwrap_or_default();
            if !user.links().same_as(&links) {
                info!("Repairing project links of user {}", user_id);
                if self.repos.users.replace_links(user_id, &links).await? {
                    report.users_repaired += 1;
                }
            }
        }

        for project in &projects {
            let likes = like_counts.get(&project.id).copied().unwrap_or(0);
            if project.like_count != likes {
                info!(
                    "Repairing like count of project {}: {} -> {}",
                    project.id, project.like_count, likes
                );
                if self.repos.projects.set_like_count(project.id, likes).await? {
                    report.projects_repaired += 1;
                }
            }
        }

        info!(
            "Reconciliation finished: {} users and {} projects repaired",
            report.users_repaired, report.projects_repaired
        );
        Ok(report)
    }
}
