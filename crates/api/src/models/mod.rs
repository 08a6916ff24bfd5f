//! Domain models for the API.
//!
//! Wire names are camelCase (`imgUrl`, `isAdmin`, `orderDetail`). Request
//! types carry raw client input; services validate them into the `New*` and
//! `*Changes` types the repositories accept.

pub mod category;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use category::{Category, CategoryRequest, CategoryWithProducts};
pub use order::{CreateOrderRequest, Order, OrderDetail, ProductRef};
pub use product::{
    CreateProductRequest, DEFAULT_IMAGE_URL, NewProduct, PageQuery, Product, ProductChanges,
    UpdateProductRequest,
};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{
    CreateUserRequest, NewUser, SignInRequest, UpdateUserRequest, User, UserChanges,
};
