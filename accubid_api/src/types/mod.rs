mod meta;
pub use self::meta::PaginatedResponse;

mod database;
pub use self::database::Database;

mod project;
pub use self::project::Project;
