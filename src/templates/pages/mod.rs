pub mod check_email;
pub mod contact_sent;
pub mod favorites;
pub mod home;
pub mod login;
pub mod property;

pub use check_email::check_email_page;
pub use contact_sent::contact_sent_page;
pub use favorites::favorites_page;
pub use home::home_page;
pub use login::login_page;
pub use property::property_page;
