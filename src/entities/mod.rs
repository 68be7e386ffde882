//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod brand;
pub mod category;
pub mod location;
pub mod location_group;
pub mod order;
pub mod order_item;
pub mod product;
pub mod review;
pub mod store;
pub mod sub_category;
pub mod variant;
pub mod variant_media;
pub mod variant_price;

// Re-export specific types to avoid conflicts
pub use brand::{Column as BrandColumn, Entity as Brand, Model as BrandModel};
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use location::{Column as LocationColumn, Entity as Location, Model as LocationModel};
pub use location_group::{
    Column as LocationGroupColumn, Entity as LocationGroup, Model as LocationGroupModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use review::{Column as ReviewColumn, Entity as Review, Model as ReviewModel};
pub use store::{Column as StoreColumn, Entity as Store, Model as StoreModel};
pub use sub_category::{
    Column as SubCategoryColumn, Entity as SubCategory, Model as SubCategoryModel,
};
pub use variant::{Column as VariantColumn, Entity as Variant, Model as VariantModel};
pub use variant_media::{
    Column as VariantMediaColumn, Entity as VariantMedia, Model as VariantMediaModel,
};
pub use variant_price::{
    Column as VariantPriceColumn, Entity as VariantPrice, Model as VariantPriceModel,
};
