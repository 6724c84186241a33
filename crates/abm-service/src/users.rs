//! User registration, login and permission checks.

use abm_core::{
  Error,
  permission::{Action, Role},
  record::Value,
  store::Repository,
  user::User,
};

use crate::{Result, ServiceError};

pub struct UserService<R> {
  repo: R,
}

impl<R> UserService<R>
where
  R: Repository<User>,
{
  pub fn new(repo: R) -> Self { Self { repo } }

  pub fn repository(&self) -> &R { &self.repo }

  fn by_username(&self, username: &str) -> Result<Vec<User>> {
    self
      .repo
      .find_by("username", Value::from(username.trim()))
      .map_err(ServiceError::store)
  }

  /// Create an account. Usernames must be unique; the schema does not
  /// enforce it, so it is checked here.
  pub fn register(&self, username: &str, password: &str, role: Role) -> Result<User> {
    let mut user = User::new(username, password, role)?;
    if !self.by_username(user.username())?.is_empty() {
      return Err(Error::constraint("username", format!("{:?} is taken", user.username())).into());
    }
    let id = self.repo.save(&mut user).map_err(ServiceError::store)?;
    tracing::info!(id, username = user.username(), %role, "user registered");
    Ok(user)
  }

  /// Check credentials. On success the new `last_access` is persisted and the
  /// logged-in user is returned; on failure nothing is written.
  pub fn login(&self, username: &str, password: &str) -> Result<Option<User>> {
    for mut user in self.by_username(username)? {
      if user.login(username.trim(), password) {
        self.repo.update(&user).map_err(ServiceError::store)?;
        tracing::info!(username = user.username(), "login succeeded");
        return Ok(Some(user));
      }
    }
    tracing::warn!(username, "login failed");
    Ok(None)
  }

  /// End the session. Nothing is persisted.
  pub fn logout(&self, user: &mut User) -> bool {
    let was_logged_in = user.logout();
    if !was_logged_in {
      tracing::warn!(username = user.username(), "logout without login");
    }
    was_logged_in
  }

  /// `Ok(())` if the user's role allows `action`.
  pub fn authorize(&self, user: &User, action: Action) -> Result<()> {
    if user.can(action) {
      return Ok(());
    }
    Err(ServiceError::Forbidden { role: user.role(), action })
  }

  pub fn change_password(&self, id: i64, password: &str) -> Result<User> {
    let mut user = self
      .find(id)?
      .ok_or_else(|| ServiceError::NotFound(format!("user {id}")))?;
    user.set_password(password)?;
    self.repo.update(&user).map_err(ServiceError::store)?;
    Ok(user)
  }

  pub fn find(&self, id: i64) -> Result<Option<User>> {
    self.repo.find_by_id(id).map_err(ServiceError::store)
  }

  pub fn delete(&self, id: i64) -> Result<bool> {
    self.repo.delete(id).map_err(ServiceError::store)
  }

  pub fn list_all(&self) -> Result<Vec<User>> {
    self.repo.find_all().map_err(ServiceError::store)
  }
}

#[cfg(test)]
mod tests {
  use abm_core::audit::Auditable as _;
  use abm_store_sqlite::{ConnectionProvider, SqliteRepository};

  use super::*;

  fn service() -> (ConnectionProvider, UserService<SqliteRepository<User>>) {
    let provider = ConnectionProvider::in_memory().unwrap();
    provider.ensure_schema().unwrap();
    let service = UserService::new(provider.repository().unwrap());
    (provider, service)
  }

  #[test]
  fn login_scenario() {
    let (_p, svc) = service();
    let ana = svc.register("ana", "1234", Role::Basic).unwrap();
    let id = ana.id().unwrap();
    assert_eq!(ana.last_access(), None);

    let logged = svc.login("ana", "1234").unwrap().expect("valid credentials");
    assert!(logged.is_logged_in());
    let stamped = logged.last_access().expect("last_access set");
    assert_eq!(svc.find(id).unwrap().unwrap().last_access(), Some(stamped));

    assert!(svc.login("ana", "wrong").unwrap().is_none());
    assert_eq!(svc.find(id).unwrap().unwrap().last_access(), Some(stamped));
  }

  #[test]
  fn unknown_user_cannot_login() {
    let (_p, svc) = service();
    assert!(svc.login("nadie", "1234").unwrap().is_none());
  }

  #[test]
  fn duplicate_username_is_a_constraint_violation() {
    let (_p, svc) = service();
    svc.register("ana", "1234", Role::Basic).unwrap();
    let err = svc.register(" ana ", "5678", Role::Admin).unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(svc.list_all().unwrap().len(), 1);
  }

  #[test]
  fn empty_credentials_are_rejected() {
    let (_p, svc) = service();
    assert!(svc.register("", "1234", Role::Basic).unwrap_err().is_constraint_violation());
    assert!(svc.register("ana", "", Role::Basic).unwrap_err().is_constraint_violation());
  }

  #[test]
  fn logout_does_not_persist() {
    let (_p, svc) = service();
    svc.register("ana", "1234", Role::Basic).unwrap();
    let mut ana = svc.login("ana", "1234").unwrap().unwrap();
    let stored_before = svc.find(ana.id().unwrap()).unwrap().unwrap();

    assert!(svc.logout(&mut ana));
    assert!(!svc.logout(&mut ana));

    let stored_after = svc.find(ana.id().unwrap()).unwrap().unwrap();
    assert_eq!(stored_after.updated_at(), stored_before.updated_at());
  }

  #[test]
  fn authorization_follows_role_table() {
    let (_p, svc) = service();
    let basic = svc.register("ana", "1234", Role::Basic).unwrap();
    let admin = svc.register("root", "toor", Role::Admin).unwrap();

    svc.authorize(&basic, Action::AddContact).unwrap();
    let err = svc.authorize(&basic, Action::DeleteContact).unwrap_err();
    assert!(matches!(
      err,
      ServiceError::Forbidden { role: Role::Basic, action: Action::DeleteContact }
    ));
    svc.authorize(&admin, Action::ManageUsers).unwrap();
  }

  #[test]
  fn change_password_persists_new_hash() {
    let (_p, svc) = service();
    let id = svc.register("ana", "1234", Role::Basic).unwrap().id().unwrap();

    svc.change_password(id, "5678").unwrap();
    assert!(svc.login("ana", "1234").unwrap().is_none());
    assert!(svc.login("ana", "5678").unwrap().is_some());

    assert!(matches!(svc.change_password(404, "x"), Err(ServiceError::NotFound(_))));
  }
}
