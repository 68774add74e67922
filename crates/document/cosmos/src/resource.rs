use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use resorts_core::DocumentLink;

/// Characters escaped when a resource name is placed in a URL path.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(name: &str) -> String {
    utf8_percent_encode(name, PATH_SEGMENT).to_string()
}

/// Address of a Cosmos DB REST resource.
///
/// `path` is appended to the account endpoint; `resource_type` and `link`
/// are the values signed into the `authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// URL path relative to the account endpoint (escaped).
    pub path: String,
    /// Resource type of the request (`dbs`, `colls`, `docs`, `attachments`).
    pub resource_type: &'static str,
    /// Resource link used for signing.
    pub link: String,
}

impl Resource {
    /// The account's database feed.
    pub fn databases() -> Self {
        Self {
            path: "dbs".to_owned(),
            resource_type: "dbs",
            link: String::new(),
        }
    }

    /// The collection feed of a database.
    pub fn collections(database: &str) -> Self {
        Self {
            path: format!("dbs/{}/colls", segment(database)),
            resource_type: "colls",
            link: format!("dbs/{database}"),
        }
    }

    /// The document feed of a collection.
    pub fn documents(database: &str, collection: &str) -> Self {
        Self {
            path: format!("dbs/{}/colls/{}/docs", segment(database), segment(collection)),
            resource_type: "docs",
            link: format!("dbs/{database}/colls/{collection}"),
        }
    }

    /// A single document, addressed by name.
    pub fn document(database: &str, collection: &str, id: &str) -> Self {
        Self {
            path: format!(
                "dbs/{}/colls/{}/docs/{}",
                segment(database),
                segment(collection),
                segment(id)
            ),
            resource_type: "docs",
            link: format!("dbs/{database}/colls/{collection}/docs/{id}"),
        }
    }

    /// The attachment feed of a stored document, addressed by its self link.
    ///
    /// Self links are resource-id based, so the signed link is the
    /// document's resource id, lowercased.
    pub fn attachments(document: &DocumentLink) -> Self {
        let trimmed = document.trimmed();
        let rid = trimmed.rsplit('/').next().unwrap_or(trimmed);
        Self {
            path: format!("{trimmed}/attachments"),
            resource_type: "attachments",
            link: rid.to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_based_links_keep_case() {
        let r = Resource::document("Resorts", "Alps", "R-1");
        assert_eq!(r.path, "dbs/Resorts/colls/Alps/docs/R-1");
        assert_eq!(r.link, "dbs/Resorts/colls/Alps/docs/R-1");
        assert_eq!(r.resource_type, "docs");
    }

    #[test]
    fn feeds_sign_their_parent() {
        assert_eq!(Resource::databases().link, "");
        assert_eq!(Resource::collections("db").link, "dbs/db");
        assert_eq!(Resource::collections("db").path, "dbs/db/colls");
        let docs = Resource::documents("db", "coll");
        assert_eq!(docs.path, "dbs/db/colls/coll/docs");
        assert_eq!(docs.link, "dbs/db/colls/coll");
    }

    #[test]
    fn names_are_escaped_in_paths_only() {
        let r = Resource::document("db", "coll", "a b/c");
        assert_eq!(r.path, "dbs/db/colls/coll/docs/a%20b%2Fc");
        assert_eq!(r.link, "dbs/db/colls/coll/docs/a b/c");
    }

    #[test]
    fn attachment_feed_uses_lowercased_rid() {
        let link = DocumentLink::new("r-1", "dbs/AbCd==/colls/AbCdEF==/docs/AbCdEFgh+A==/");
        let r = Resource::attachments(&link);
        assert_eq!(r.path, "dbs/AbCd==/colls/AbCdEF==/docs/AbCdEFgh+A==/attachments");
        assert_eq!(r.resource_type, "attachments");
        assert_eq!(r.link, "abcdefgh+a==");
    }
}
