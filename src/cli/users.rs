use chrono::Utc;
use tabled::Table;

use crate::{
    config::Settings,
    error, info,
    management::{FileUserStore, UserStore},
    success,
    types::{UserRecord, UserTableRow},
    utils, warning,
};

fn store(settings: &Settings) -> FileUserStore {
    FileUserStore::new(&settings.users_file)
}

pub async fn list_users(settings: &Settings, active_only: bool) {
    let store = store(settings);
    let users = if active_only {
        store.list_active_users().await
    } else {
        store.list_users().await
    };

    match users {
        Ok(mut users) if !users.is_empty() => {
            users.sort_by(|a, b| a.email.to_lowercase().cmp(&b.email.to_lowercase()));
            let rows: Vec<UserTableRow> = users.iter().map(UserTableRow::from).collect();
            println!("{}", Table::new(rows));
        }
        Ok(_) => info!("No users registered in {}", store.path().display()),
        Err(e) => error!("Cannot load users. Err: {}", e),
    }
}

/// Registers a user, or updates the refresh token of an existing one.
///
/// Existing users keep their opt-in flag and playlist id.
pub async fn add_user(
    settings: &Settings,
    email: String,
    user_id: String,
    refresh_token: String,
    active: bool,
) {
    let store = store(settings);
    let existing = match store.get(&email).await {
        Ok(existing) => existing,
        Err(e) => error!("Cannot load users. Err: {}", e),
    };

    let record = match existing {
        Some(mut user) => {
            user.user_id = user_id;
            user.refresh_token = refresh_token;
            user.updated_at = Some(utils::format_timestamp(Utc::now()));
            user
        }
        None => UserRecord {
            user_id,
            email,
            refresh_token,
            active,
            release_radar_id: None,
            updated_at: Some(utils::format_timestamp(Utc::now())),
        },
    };

    match store.save(&record).await {
        Ok(()) => success!("Saved user {}", record.email),
        Err(e) => error!("Cannot save user. Err: {}", e),
    }
}

pub async fn set_active(settings: &Settings, email: &str, active: bool) {
    let store = store(settings);
    let mut user = match store.get(email).await {
        Ok(Some(user)) => user,
        Ok(None) => error!("No user registered with email {}", email),
        Err(e) => error!("Cannot load users. Err: {}", e),
    };

    if user.active == active {
        warning!("{} is already {}", email, if active { "active" } else { "inactive" });
        return;
    }

    user.active = active;
    user.updated_at = Some(utils::format_timestamp(Utc::now()));
    match store.save(&user).await {
        Ok(()) if active => success!("{} opted in to the release radar", email),
        Ok(()) => success!("{} opted out of the release radar", email),
        Err(e) => error!("Cannot save user. Err: {}", e),
    }
}

pub async fn show_user(settings: &Settings, email: &str) {
    match store(settings).get(email).await {
        Ok(Some(user)) => println!("{}", Table::new(vec![UserTableRow::from(&user)])),
        Ok(None) => warning!("No user registered with email {}", email),
        Err(e) => error!("Cannot load users. Err: {}", e),
    }
}
