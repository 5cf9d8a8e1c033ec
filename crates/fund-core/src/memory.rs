//! In-memory backend used by the unit tests in this crate.

use std::{
  collections::{HashMap, HashSet},
  convert::Infallible,
  sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
  moderation::{ContentRef, NewReport, ReportInsert},
  principal::{NewPrincipal, Principal, PrivilegeClass},
  lifecycle::{can_cancel, compute_status},
  project::{
    CancelUpdate, Comment, Donation, DonationInsert, NewComment, NewProject, Project,
    ProjectStatus, Rating, RatingStats,
  },
  session::SessionHandle,
  store::{
    DonationLedger, PrincipalStore, ProjectStore, ReportLedger, SessionStore,
    Storage, TokenRepository,
  },
  token::{TokenDigest, TokenKind, TokenRecord},
};

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
  tokens:     Vec<TokenRecord>,
  sessions:   HashMap<(String, &'static str), (String, DateTime<Utc>)>,
  principals: HashMap<Uuid, Principal>,
  projects:   HashMap<Uuid, Project>,
  comments:   HashMap<Uuid, Comment>,
  donations:  Vec<Donation>,
  ratings:    HashMap<(Uuid, Uuid), Rating>,
  content:    HashSet<ContentRef>,
  reports:    HashSet<(Uuid, ContentRef)>,
}

impl Inner {
  fn raised(&self, project_id: Uuid) -> Decimal {
    self
      .donations
      .iter()
      .filter(|d| d.project_id == project_id)
      .map(|d| d.amount)
      .sum()
  }
}

pub fn principal(email: &str, class: PrivilegeClass, active: bool) -> Principal {
  principal_with_password(email, class, active, "")
}

pub fn principal_with_password(
  email: &str,
  class: PrivilegeClass,
  active: bool,
  password_hash: &str,
) -> Principal {
  let elevated = class == PrivilegeClass::Elevated;
  Principal {
    principal_id:  Uuid::new_v4(),
    email:         email.to_owned(),
    first_name:    "Test".into(),
    last_name:     "Principal".into(),
    password_hash: password_hash.to_owned(),
    is_staff:      elevated,
    is_superuser:  false,
    is_active:     active,
    created_at:    Utc::now(),
  }
}

impl MemoryStore {
  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().expect("memory store poisoned")
  }

  pub fn token_count(&self, owner_id: Uuid, kind: TokenKind) -> usize {
    self
      .lock()
      .tokens
      .iter()
      .filter(|t| t.owner_id == owner_id && t.kind == kind)
      .count()
  }

  pub fn session_len(&self, session: &SessionHandle) -> usize {
    self
      .lock()
      .sessions
      .keys()
      .filter(|(s, _)| s == session.as_str())
      .count()
  }

  pub fn insert_principal(&self, principal: Principal) {
    self.lock().principals.insert(principal.principal_id, principal);
  }

  pub fn push_donation(&self, project_id: Uuid, amount: Decimal) {
    self.lock().donations.push(Donation {
      donation_id: Uuid::new_v4(),
      project_id,
      donor_id: Uuid::new_v4(),
      amount,
      donated_at: Utc::now(),
    });
  }

  pub fn insert_content(&self, content: ContentRef) {
    self.lock().content.insert(content);
  }

  pub fn content_exists(&self, content: ContentRef) -> bool {
    self.lock().content.contains(&content)
  }
}

impl Storage for MemoryStore {
  type Error = Infallible;
}

impl TokenRepository for MemoryStore {
  async fn replace_token(&self, record: TokenRecord) -> Result<(), Infallible> {
    let mut inner = self.lock();
    inner
      .tokens
      .retain(|t| !(t.owner_id == record.owner_id && t.kind == record.kind));
    inner.tokens.push(record);
    Ok(())
  }

  async fn find_token(
    &self,
    kind: TokenKind,
    digest: TokenDigest,
  ) -> Result<Option<TokenRecord>, Infallible> {
    Ok(
      self
        .lock()
        .tokens
        .iter()
        .find(|t| t.kind == kind && t.digest == digest)
        .cloned(),
    )
  }

  async fn take_token(
    &self,
    kind: TokenKind,
    digest: TokenDigest,
  ) -> Result<Option<TokenRecord>, Infallible> {
    let mut inner = self.lock();
    let pos = inner
      .tokens
      .iter()
      .position(|t| t.kind == kind && t.digest == digest);
    Ok(pos.map(|i| inner.tokens.remove(i)))
  }

  async fn delete_token(&self, kind: TokenKind, digest: TokenDigest) -> Result<bool, Infallible> {
    let mut inner = self.lock();
    let before = inner.tokens.len();
    inner.tokens.retain(|t| !(t.kind == kind && t.digest == digest));
    Ok(inner.tokens.len() < before)
  }

  async fn delete_expired(
    &self,
    kind: TokenKind,
    cutoff: DateTime<Utc>,
  ) -> Result<usize, Infallible> {
    let mut inner = self.lock();
    let before = inner.tokens.len();
    inner.tokens.retain(|t| !(t.kind == kind && t.issued_at < cutoff));
    Ok(before - inner.tokens.len())
  }

  async fn delete_tokens_for_owner(&self, owner_id: Uuid) -> Result<usize, Infallible> {
    let mut inner = self.lock();
    let before = inner.tokens.len();
    inner.tokens.retain(|t| t.owner_id != owner_id);
    Ok(before - inner.tokens.len())
  }

  async fn delete_all_tokens(&self) -> Result<usize, Infallible> {
    Ok(self.lock().tokens.drain(..).count())
  }
}

impl SessionStore for MemoryStore {
  async fn get_value(
    &self,
    session: SessionHandle,
    key: &'static str,
    written_after: DateTime<Utc>,
  ) -> Result<Option<String>, Infallible> {
    Ok(
      self
        .lock()
        .sessions
        .get(&(session.as_str().to_owned(), key))
        .filter(|(_, at)| *at >= written_after)
        .map(|(value, _)| value.clone()),
    )
  }

  async fn put_value(
    &self,
    session: SessionHandle,
    key: &'static str,
    value: String,
  ) -> Result<(), Infallible> {
    self
      .lock()
      .sessions
      .insert((session.as_str().to_owned(), key), (value, Utc::now()));
    Ok(())
  }

  async fn remove_value(&self, session: SessionHandle, key: &'static str) -> Result<(), Infallible> {
    self.lock().sessions.remove(&(session.as_str().to_owned(), key));
    Ok(())
  }

  async fn purge_values(&self, cutoff: DateTime<Utc>) -> Result<usize, Infallible> {
    let mut inner = self.lock();
    let before = inner.sessions.len();
    inner.sessions.retain(|_, (_, at)| *at >= cutoff);
    Ok(before - inner.sessions.len())
  }
}

impl PrincipalStore for MemoryStore {
  async fn find_by_email(&self, email: String) -> Result<Option<Principal>, Infallible> {
    Ok(self.lock().principals.values().find(|p| p.email == email).cloned())
  }

  async fn get_principal(&self, principal_id: Uuid) -> Result<Option<Principal>, Infallible> {
    Ok(self.lock().principals.get(&principal_id).cloned())
  }

  async fn create_principal(&self, input: NewPrincipal) -> Result<Option<Principal>, Infallible> {
    let mut inner = self.lock();
    if inner.principals.values().any(|p| p.email == input.email) {
      return Ok(None);
    }
    let principal = Principal {
      principal_id:  Uuid::new_v4(),
      email:         input.email,
      first_name:    input.first_name,
      last_name:     input.last_name,
      password_hash: input.password_hash,
      is_staff:      input.is_staff,
      is_superuser:  input.is_superuser,
      is_active:     input.is_active,
      created_at:    Utc::now(),
    };
    inner.principals.insert(principal.principal_id, principal.clone());
    Ok(Some(principal))
  }

  async fn activate_principal(&self, principal_id: Uuid) -> Result<bool, Infallible> {
    Ok(match self.lock().principals.get_mut(&principal_id) {
      Some(p) => {
        p.is_active = true;
        true
      }
      None => false,
    })
  }

  async fn set_password_hash(
    &self,
    principal_id: Uuid,
    password_hash: String,
  ) -> Result<bool, Infallible> {
    Ok(match self.lock().principals.get_mut(&principal_id) {
      Some(p) => {
        p.password_hash = password_hash;
        true
      }
      None => false,
    })
  }

  async fn delete_principal(&self, principal_id: Uuid) -> Result<bool, Infallible> {
    Ok(self.lock().principals.remove(&principal_id).is_some())
  }
}

impl ProjectStore for MemoryStore {
  async fn create_project(&self, input: NewProject) -> Result<Project, Infallible> {
    let project = Project {
      project_id:    Uuid::new_v4(),
      creator_id:    input.creator_id,
      title:         input.title,
      description:   input.description,
      status:        ProjectStatus::Active,
      start_at:      input.start_at,
      end_at:        input.end_at,
      target_amount: input.target_amount,
      created_at:    Utc::now(),
    };
    let mut inner = self.lock();
    inner.content.insert(ContentRef::Project(project.project_id));
    inner.projects.insert(project.project_id, project.clone());
    Ok(project)
  }

  async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, Infallible> {
    Ok(self.lock().projects.get(&project_id).cloned())
  }

  async fn cancel_project(&self, project_id: Uuid) -> Result<CancelUpdate, Infallible> {
    let mut inner = self.lock();
    let raised = inner.raised(project_id);
    let Some(project) = inner.projects.get_mut(&project_id) else {
      return Ok(CancelUpdate::ProjectMissing);
    };
    Ok(if project.status == ProjectStatus::Canceled {
      CancelUpdate::AlreadyCanceled(project.clone())
    } else if can_cancel(raised, project.target_amount) {
      project.status = ProjectStatus::Canceled;
      CancelUpdate::Canceled(project.clone())
    } else {
      CancelUpdate::Refused
    })
  }

  async fn record_donation(
    &self,
    project_id: Uuid,
    donor_id: Uuid,
    amount: Decimal,
    now: DateTime<Utc>,
  ) -> Result<DonationInsert, Infallible> {
    let mut inner = self.lock();
    let Some(project) = inner.projects.get(&project_id) else {
      return Ok(DonationInsert::ProjectMissing);
    };
    if compute_status(project.status, project.end_at, now) != ProjectStatus::Active {
      return Ok(DonationInsert::NotAccepting);
    }
    let donation = Donation {
      donation_id: Uuid::new_v4(),
      project_id,
      donor_id,
      amount,
      donated_at: now,
    };
    inner.donations.push(donation.clone());
    Ok(DonationInsert::Recorded(donation))
  }

  async fn add_comment(&self, input: NewComment) -> Result<Comment, Infallible> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      project_id: input.project_id,
      author_id:  input.author_id,
      parent_id:  input.parent_id,
      body:       input.body,
      created_at: Utc::now(),
    };
    let mut inner = self.lock();
    inner.content.insert(ContentRef::Comment(comment.comment_id));
    inner.comments.insert(comment.comment_id, comment.clone());
    Ok(comment)
  }

  async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>, Infallible> {
    Ok(self.lock().comments.get(&comment_id).cloned())
  }

  async fn rate_project(&self, rating: Rating) -> Result<Option<Rating>, Infallible> {
    let mut inner = self.lock();
    if !inner.projects.contains_key(&rating.project_id) {
      return Ok(None);
    }
    inner
      .ratings
      .insert((rating.project_id, rating.rater_id), rating.clone());
    Ok(Some(rating))
  }

  async fn rating_stats(&self, project_id: Uuid) -> Result<RatingStats, Infallible> {
    let inner = self.lock();
    let values: Vec<u64> = inner
      .ratings
      .values()
      .filter(|r| r.project_id == project_id)
      .map(|r| u64::from(r.value))
      .collect();
    Ok(RatingStats::from_total(values.len() as u64, values.iter().sum()))
  }
}

impl DonationLedger for MemoryStore {
  async fn sum_donations(&self, project_id: Uuid) -> Result<Decimal, Infallible> {
    Ok(self.lock().raised(project_id))
  }
}

impl ReportLedger for MemoryStore {
  async fn report_exists(&self, reporter_id: Uuid, content: ContentRef) -> Result<bool, Infallible> {
    Ok(self.lock().reports.contains(&(reporter_id, content)))
  }

  async fn record_report(&self, report: NewReport) -> Result<ReportInsert, Infallible> {
    let mut inner = self.lock();
    if !inner.content.contains(&report.content) {
      return Ok(ReportInsert::ContentMissing);
    }
    Ok(if inner.reports.insert((report.reporter_id, report.content)) {
      ReportInsert::Recorded
    } else {
      ReportInsert::Duplicate
    })
  }

  async fn count_reports(&self, content: ContentRef) -> Result<u64, Infallible> {
    Ok(self.lock().reports.iter().filter(|(_, c)| *c == content).count() as u64)
  }

  async fn remove_content(&self, content: ContentRef) -> Result<bool, Infallible> {
    let mut inner = self.lock();
    if !inner.content.remove(&content) {
      return Ok(false);
    }
    inner.reports.retain(|(_, c)| *c != content);
    match content {
      ContentRef::Project(id) => {
        inner.projects.remove(&id);
        inner.ratings.retain(|(project_id, _), _| *project_id != id);
      }
      ContentRef::Comment(id) => {
        inner.comments.remove(&id);
      }
    }
    Ok(true)
  }
}
