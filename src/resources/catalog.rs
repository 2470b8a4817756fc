use super::{Access, FieldKind, FieldSpec, Resource};

use FieldKind::*;

pub struct Product;

impl Resource for Product {
    const NAME: &'static str = "products";
    const TOPIC: &'static str = "products_changed";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name", String),
        FieldSpec::optional("description", String),
        FieldSpec::optional("category", String),
        FieldSpec::optional("price", Number),
        FieldSpec::optional("image_url", String),
        FieldSpec::optional("features", Array),
        FieldSpec::optional("is_active", Bool),
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];
}

pub struct Service;

impl Resource for Service {
    const NAME: &'static str = "services";
    const TOPIC: &'static str = "services_changed";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("title", String),
        FieldSpec::optional("description", String),
        FieldSpec::optional("icon", String),
        FieldSpec::optional("price_range", String),
        FieldSpec::optional("features", Array),
        FieldSpec::optional("sort_order", Integer),
        FieldSpec::optional("is_active", Bool),
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "description"];
}

pub struct Testimonial;

impl Resource for Testimonial {
    const NAME: &'static str = "testimonials";
    const TOPIC: &'static str = "testimonials_changed";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("client_name", String),
        FieldSpec::required("content", String),
        FieldSpec::optional("company", String),
        FieldSpec::optional("position", String),
        FieldSpec::optional("rating", Integer),
        FieldSpec::optional("avatar_url", String),
        FieldSpec::optional("is_featured", Bool),
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["client_name"];
}

pub struct BlogPost;

impl Resource for BlogPost {
    const NAME: &'static str = "blog_posts";
    const TOPIC: &'static str = "blog_posts_changed";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("title", String),
        FieldSpec::required("slug", String),
        FieldSpec::optional("excerpt", String),
        FieldSpec::optional("content", String),
        FieldSpec::optional("author", String),
        FieldSpec::optional("cover_image", String),
        FieldSpec::optional("tags", Array),
        FieldSpec::optional("published", Bool),
        FieldSpec::optional("published_at", String),
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["title", "excerpt"];
}

pub struct Contact;

impl Resource for Contact {
    const NAME: &'static str = "contacts";
    const TOPIC: &'static str = "contacts_changed";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name", String),
        FieldSpec::required("email", String),
        FieldSpec::required("message", String),
        FieldSpec::optional("phone", String),
        FieldSpec::optional("subject", String),
        FieldSpec::optional("status", String),
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email"];
    const ACCESS: Access = Access::PublicCreate;
}

pub struct Quote;

impl Resource for Quote {
    const NAME: &'static str = "quotes";
    const TOPIC: &'static str = "quotes_changed";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("name", String),
        FieldSpec::required("email", String),
        FieldSpec::optional("phone", String),
        FieldSpec::optional("company", String),
        FieldSpec::optional("service_type", String),
        FieldSpec::optional("budget", String),
        FieldSpec::optional("timeline", String),
        FieldSpec::optional("details", String),
        FieldSpec::optional("status", String),
    ];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email"];
    const ACCESS: Access = Access::PublicCreate;
}
