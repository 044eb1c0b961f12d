//! Content types and collection schema descriptors.
//!
//! Each content type owns exactly one collection in the search engine.
//! Schemas are static: they are declared here at process start and only
//! ever change through a destructive drop-and-recreate during a rebuild.

use serde::Serialize;
use std::fmt;

/// A category of searchable entity. One collection per content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Project,
    Discussion,
    LearningContent,
}

impl ContentType {
    /// All content types, in rebuild order.
    pub const ALL: [ContentType; 3] = [
        ContentType::Project,
        ContentType::Discussion,
        ContentType::LearningContent,
    ];

    /// Name of the engine collection holding this type's documents.
    pub fn collection_name(self) -> &'static str {
        match self {
            ContentType::Project => "projects",
            ContentType::Discussion => "discussions",
            ContentType::LearningContent => "learning_content",
        }
    }

    /// Tag attached to each reshaped search hit of this type.
    pub fn result_tag(self) -> &'static str {
        match self {
            ContentType::Project => "project",
            ContentType::Discussion => "discussion",
            ContentType::LearningContent => "learning_content",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.result_tag())
    }
}

/// Field type in an index schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "string[]")]
    StringArray,
}

/// One field in a collection schema. Optional flags serialize only when
/// set, matching the engine's schema wire format.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facet: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
}

impl FieldSpec {
    pub fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::String,
            facet: None,
            weight: None,
            index: None,
        }
    }

    pub fn string_array(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::StringArray,
            facet: None,
            weight: None,
            index: None,
        }
    }

    /// Mark the field usable in exact-match filter predicates.
    pub fn facet(mut self) -> Self {
        self.facet = Some(true);
        self
    }

    /// Set the relevance weight for free-text matching.
    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Mark the field as participating in free-text matching.
    pub fn indexed(mut self) -> Self {
        self.index = Some(true);
        self
    }
}

/// The index shape for one content type: collection name plus ordered
/// field list.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

/// Build the fixed schema descriptor for a content type.
pub fn collection_schema(content_type: ContentType) -> CollectionSchema {
    let fields = match content_type {
        ContentType::Project => vec![
            FieldSpec::string("id"),
            FieldSpec::string("project_name"),
            FieldSpec::string("description"),
            FieldSpec::string_array("team_user_ids").facet(),
        ],
        ContentType::Discussion => vec![
            FieldSpec::string("id"),
            FieldSpec::string("title").weight(3).indexed(),
            FieldSpec::string("project_id"),
            FieldSpec::string("description").weight(1).indexed(),
            FieldSpec::string_array("team_user_ids").facet(),
        ],
        ContentType::LearningContent => vec![
            FieldSpec::string("id"),
            FieldSpec::string("title").weight(3),
            FieldSpec::string("content"),
            FieldSpec::string("category").facet(),
            FieldSpec::string("slug"),
        ],
    };

    CollectionSchema {
        name: content_type.collection_name().to_string(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_schema_fields() {
        let schema = collection_schema(ContentType::Project);
        assert_eq!(schema.name, "projects");
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "project_name", "description", "team_user_ids"]);

        let acl = &schema.fields[3];
        assert_eq!(acl.field_type, FieldType::StringArray);
        assert_eq!(acl.facet, Some(true));
    }

    #[test]
    fn test_discussion_schema_weights() {
        let schema = collection_schema(ContentType::Discussion);
        assert_eq!(schema.name, "discussions");

        let title = schema.fields.iter().find(|f| f.name == "title").unwrap();
        assert_eq!(title.weight, Some(3));
        assert_eq!(title.index, Some(true));

        let description = schema
            .fields
            .iter()
            .find(|f| f.name == "description")
            .unwrap();
        assert_eq!(description.weight, Some(1));
        assert_eq!(description.index, Some(true));
    }

    #[test]
    fn test_learning_content_schema() {
        let schema = collection_schema(ContentType::LearningContent);
        assert_eq!(schema.name, "learning_content");
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "title", "content", "category", "slug"]);

        let category = &schema.fields[3];
        assert_eq!(category.facet, Some(true));
    }

    #[test]
    fn test_schema_wire_format() {
        let schema = collection_schema(ContentType::Project);
        let json = serde_json::to_value(&schema).unwrap();

        assert_eq!(json["name"], "projects");
        assert_eq!(json["fields"][0]["type"], "string");
        assert_eq!(json["fields"][3]["type"], "string[]");
        assert_eq!(json["fields"][3]["facet"], true);
        // Unset flags must not appear at all
        assert!(json["fields"][0].get("facet").is_none());
        assert!(json["fields"][0].get("weight").is_none());
    }
}
