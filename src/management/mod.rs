mod users;

pub use users::FileUserStore;
pub use users::UserStore;
