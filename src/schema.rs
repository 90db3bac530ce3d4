// Kept in sync with the DDL in repository::diesel_wishlist::SCHEMA_SQL.

diesel::table! {
    storage_meta (key) {
        key -> Text,
        value -> Text,
    }
}

diesel::table! {
    wishlist (id) {
        id -> Integer,
        title -> Text,
        image -> Text,
        price -> Text,
        currency -> Text,
        site_name -> Text,
        source_url -> Text,
        normalized_url -> Nullable<Text>,
        dedup_key -> Text,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(storage_meta, wishlist);
