//! Document control: review, approval, release and revision

use chrono::Utc;
use serde_json::json;

use super::{ensure, require_text, QualityEngine};
use crate::core::error::{QualityError, QualityResult};
use crate::core::events::EventPublisher;
use crate::core::identity::{EntityId, TenantId};
use crate::core::sequence::SequenceKind;
use crate::core::store::QualityStore;
use crate::entities::document::{
    AccessLevel, CreateDocument, DocumentStatus, DocumentType, UpdateDocument,
};
use crate::entities::QualityDocument;

/// Criteria for [`QualityEngine::list_documents`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub document_type: Option<DocumentType>,
    pub status: Option<DocumentStatus>,
    pub category: Option<String>,
    pub department_id: Option<String>,
    pub owner_id: Option<String>,
    pub access_level: Option<AccessLevel>,
    /// Case-insensitive text in title, number or description
    pub search: Option<String>,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &QualityDocument) -> bool {
        self.document_type.map_or(true, |t| doc.document_type == t)
            && self.status.map_or(true, |s| doc.status == s)
            && self
                .category
                .as_ref()
                .map_or(true, |c| doc.category.as_ref() == Some(c))
            && self
                .department_id
                .as_ref()
                .map_or(true, |d| doc.department_id.as_ref() == Some(d))
            && self.owner_id.as_ref().map_or(true, |o| &doc.owner_id == o)
            && self.access_level.map_or(true, |a| doc.access_level == a)
            && self.search.as_ref().map_or(true, |s| doc.matches_text(s))
    }
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    /// Create a draft numbered within its document type
    pub fn create_document(
        &mut self,
        tenant: &TenantId,
        input: CreateDocument,
    ) -> QualityResult<QualityDocument> {
        require_text(&input.title, "title")?;
        require_text(&input.owner_id, "owner_id")?;

        let number =
            self.allocate_number(tenant, SequenceKind::Document(input.document_type))?;
        let doc = QualityDocument::new(tenant.clone(), number, input);
        self.save(&doc)?;

        tracing::info!(document = %doc.document_number, tenant = %tenant, "created document");
        self.emit(
            "document.created",
            tenant,
            json!({
                "document_id": doc.id,
                "document_number": doc.document_number,
                "document_type": doc.document_type,
            }),
        );
        Ok(doc)
    }

    pub fn get_document(&self, tenant: &TenantId, id: &EntityId) -> QualityResult<QualityDocument> {
        self.load(tenant, id)
    }

    pub fn find_document_by_number(
        &self,
        tenant: &TenantId,
        number: &str,
    ) -> QualityResult<QualityDocument> {
        self.list_all::<QualityDocument>(tenant)?
            .into_iter()
            .find(|d| d.document_number.eq_ignore_ascii_case(number))
            .ok_or_else(|| QualityError::not_found("Document", number))
    }

    /// Documents matching `filter`, most recently updated first
    pub fn list_documents(
        &self,
        tenant: &TenantId,
        filter: &DocumentFilter,
    ) -> QualityResult<Vec<QualityDocument>> {
        let mut items: Vec<QualityDocument> = self
            .list_all::<QualityDocument>(tenant)?
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }

    pub fn update_document(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: UpdateDocument,
    ) -> QualityResult<QualityDocument> {
        let mut doc: QualityDocument = self.load(tenant, id)?;
        ensure(
            doc.status == DocumentStatus::Draft,
            "Only draft documents can be updated directly",
        )?;

        if let Some(title) = input.title {
            require_text(&title, "title")?;
            doc.title = title;
        }
        if input.description.is_some() {
            doc.description = input.description;
        }
        if input.category.is_some() {
            doc.category = input.category;
        }
        if input.department_id.is_some() {
            doc.department_id = input.department_id;
        }
        if let Some(level) = input.access_level {
            doc.access_level = level;
        }
        if input.content.is_some() {
            doc.content = input.content;
        }
        if let Some(tags) = input.tags {
            doc.tags = tags;
        }
        doc.updated_at = Utc::now();
        self.save(&doc)?;

        self.emit("document.updated", tenant, json!({ "document_id": doc.id }));
        Ok(doc)
    }

    pub fn submit_document_for_review(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        reviewer_id: &str,
    ) -> QualityResult<QualityDocument> {
        require_text(reviewer_id, "reviewer_id")?;
        let mut doc: QualityDocument = self.load(tenant, id)?;
        ensure(
            doc.status == DocumentStatus::Draft,
            "Only draft documents can be submitted for review",
        )?;

        doc.status = DocumentStatus::PendingReview;
        doc.reviewer_id = Some(reviewer_id.to_string());
        doc.updated_at = Utc::now();
        self.save(&doc)?;

        self.emit(
            "document.submitted_for_review",
            tenant,
            json!({ "document_id": doc.id, "reviewer_id": reviewer_id }),
        );
        Ok(doc)
    }

    pub fn start_document_review(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<QualityDocument> {
        let mut doc: QualityDocument = self.load(tenant, id)?;
        ensure(
            doc.status == DocumentStatus::PendingReview,
            "Document is not pending review",
        )?;

        doc.status = DocumentStatus::UnderReview;
        doc.updated_at = Utc::now();
        self.save(&doc)?;

        self.emit(
            "document.review_started",
            tenant,
            json!({ "document_id": doc.id }),
        );
        Ok(doc)
    }

    /// Finish the review: a pass moves the document on to approval, a
    /// rejection sends it back to draft.
    pub fn complete_document_review(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        passed: bool,
        comments: Option<String>,
    ) -> QualityResult<QualityDocument> {
        let mut doc: QualityDocument = self.load(tenant, id)?;
        ensure(
            doc.status == DocumentStatus::UnderReview,
            "Document is not under review",
        )?;

        let now = Utc::now();
        doc.status = if passed {
            DocumentStatus::PendingApproval
        } else {
            DocumentStatus::Draft
        };
        doc.reviewed_at = Some(now);
        doc.review_comments = comments;
        doc.updated_at = now;
        self.save(&doc)?;

        let name = if passed {
            "document.review_passed"
        } else {
            "document.review_rejected"
        };
        self.emit(name, tenant, json!({ "document_id": doc.id }));
        Ok(doc)
    }

    /// Approve, making the document effective now, or send it back to draft
    pub fn approve_document(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        approved: bool,
        approver_id: &str,
    ) -> QualityResult<QualityDocument> {
        require_text(approver_id, "approver_id")?;
        let mut doc: QualityDocument = self.load(tenant, id)?;
        ensure(
            doc.status == DocumentStatus::PendingApproval,
            "Document is not pending approval",
        )?;

        let now = Utc::now();
        doc.approver_id = Some(approver_id.to_string());
        if approved {
            doc.status = DocumentStatus::Approved;
            doc.approved_at = Some(now);
            doc.effective_date = Some(now);
        } else {
            doc.status = DocumentStatus::Draft;
        }
        doc.updated_at = now;
        self.save(&doc)?;

        let name = if approved {
            "document.approved"
        } else {
            "document.approval_rejected"
        };
        self.emit(
            name,
            tenant,
            json!({ "document_id": doc.id, "approver_id": approver_id }),
        );
        Ok(doc)
    }

    pub fn release_document(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<QualityDocument> {
        let mut doc: QualityDocument = self.load(tenant, id)?;
        ensure(
            doc.status == DocumentStatus::Approved,
            "Only approved documents can be released",
        )?;

        let now = Utc::now();
        doc.status = DocumentStatus::Released;
        doc.released_at = Some(now);
        doc.updated_at = now;
        self.save(&doc)?;

        self.emit(
            "document.released",
            tenant,
            json!({ "document_id": doc.id, "version": doc.version }),
        );
        Ok(doc)
    }

    /// Open the next revision of a released document as a new draft
    pub fn revise_document(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        change_description: &str,
        changed_by: &str,
    ) -> QualityResult<QualityDocument> {
        require_text(change_description, "change_description")?;
        let mut doc: QualityDocument = self.load(tenant, id)?;
        ensure(
            doc.status == DocumentStatus::Released,
            "Only released documents can be revised",
        )?;

        doc.bump_revision(change_description.to_string(), changed_by.to_string());
        doc.status = DocumentStatus::Draft;
        doc.reviewed_at = None;
        doc.review_comments = None;
        doc.approved_at = None;
        doc.updated_at = Utc::now();
        self.save(&doc)?;

        self.emit(
            "document.revised",
            tenant,
            json!({ "document_id": doc.id, "version": doc.version, "revision": doc.revision }),
        );
        Ok(doc)
    }

    /// Retire a document from any state, optionally naming its successor
    pub fn obsolete_document(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        reason: &str,
        superseded_by: Option<EntityId>,
    ) -> QualityResult<QualityDocument> {
        let mut doc: QualityDocument = self.load(tenant, id)?;
        if let Some(successor) = &superseded_by {
            self.load::<QualityDocument>(tenant, successor)?;
        }

        doc.status = DocumentStatus::Obsolete;
        doc.obsolete_reason = Some(reason.to_string());
        doc.superseded_by = superseded_by;
        doc.updated_at = Utc::now();
        self.save(&doc)?;

        self.emit(
            "document.obsoleted",
            tenant,
            json!({
                "document_id": doc.id,
                "reason": reason,
                "superseded_by": doc.superseded_by,
            }),
        );
        Ok(doc)
    }

    pub fn archive_document(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<QualityDocument> {
        let mut doc: QualityDocument = self.load(tenant, id)?;
        ensure(
            doc.status == DocumentStatus::Obsolete,
            "Only obsolete documents can be archived",
        )?;

        doc.status = DocumentStatus::Archived;
        doc.updated_at = Utc::now();
        self.save(&doc)?;

        self.emit("document.archived", tenant, json!({ "document_id": doc.id }));
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn draft(engine: &mut TestEngine, doc_type: DocumentType, title: &str) -> QualityDocument {
        engine
            .create_document(
                &tenant("acme"),
                CreateDocument {
                    title: title.to_string(),
                    document_type: doc_type,
                    owner_id: "eng".to_string(),
                    created_by: "eng".to_string(),
                    ..CreateDocument::default()
                },
            )
            .unwrap()
    }

    fn released(engine: &mut TestEngine) -> QualityDocument {
        let t = tenant("acme");
        let doc = draft(engine, DocumentType::Procedure, "Control of nonconforming output");
        engine.submit_document_for_review(&t, &doc.id, "qm").unwrap();
        engine.start_document_review(&t, &doc.id).unwrap();
        engine.complete_document_review(&t, &doc.id, true, None).unwrap();
        engine.approve_document(&t, &doc.id, true, "director").unwrap();
        engine.release_document(&t, &doc.id).unwrap()
    }

    #[test]
    fn test_numbers_count_per_type() {
        let mut engine = engine();
        let a = draft(&mut engine, DocumentType::Procedure, "A");
        let b = draft(&mut engine, DocumentType::WorkInstruction, "B");
        let c = draft(&mut engine, DocumentType::Procedure, "C");
        assert_eq!(a.document_number, "PROC-00001");
        assert_eq!(b.document_number, "WI-00001");
        assert_eq!(c.document_number, "PROC-00002");
    }

    #[test]
    fn test_full_release_path() {
        let mut engine = engine();
        let doc = released(&mut engine);
        assert_eq!(doc.status, DocumentStatus::Released);
        assert!(doc.effective_date.is_some());
        assert!(doc.released_at.is_some());
        assert_eq!(doc.approver_id.as_deref(), Some("director"));
    }

    #[test]
    fn test_only_drafts_are_editable() {
        let mut engine = engine();
        let t = tenant("acme");
        let doc = draft(&mut engine, DocumentType::Form, "Deviation request");
        let doc = engine
            .update_document(
                &t,
                &doc.id,
                UpdateDocument {
                    title: Some("Deviation request form".to_string()),
                    access_level: Some(AccessLevel::Public),
                    ..UpdateDocument::default()
                },
            )
            .unwrap();
        assert_eq!(doc.title, "Deviation request form");
        assert_eq!(doc.access_level, AccessLevel::Public);

        engine.submit_document_for_review(&t, &doc.id, "qm").unwrap();
        let err = engine
            .update_document(&t, &doc.id, UpdateDocument::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Only draft documents can be updated directly");
    }

    #[test]
    fn test_rejections_return_to_draft() {
        let mut engine = engine();
        let t = tenant("acme");
        let doc = draft(&mut engine, DocumentType::Policy, "Quality policy");

        let err = engine.start_document_review(&t, &doc.id).unwrap_err();
        assert_eq!(err.to_string(), "Document is not pending review");

        engine.submit_document_for_review(&t, &doc.id, "qm").unwrap();
        engine.start_document_review(&t, &doc.id).unwrap();
        let doc = engine
            .complete_document_review(&t, &doc.id, false, Some("clarify scope".to_string()))
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert!(engine.publisher().last("document.review_rejected").is_some());

        engine.submit_document_for_review(&t, &doc.id, "qm").unwrap();
        engine.start_document_review(&t, &doc.id).unwrap();
        engine.complete_document_review(&t, &doc.id, true, None).unwrap();
        let doc = engine.approve_document(&t, &doc.id, false, "director").unwrap();
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert!(doc.effective_date.is_none());

        let err = engine.release_document(&t, &doc.id).unwrap_err();
        assert_eq!(err.to_string(), "Only approved documents can be released");
    }

    #[test]
    fn test_revise_bumps_version() {
        let mut engine = engine();
        let t = tenant("acme");
        let doc = released(&mut engine);

        let doc = engine
            .revise_document(&t, &doc.id, "Add rework step", "eng")
            .unwrap();
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert_eq!(doc.version, "1.1");
        assert_eq!(doc.revision_history.len(), 2);

        let err = engine
            .revise_document(&t, &doc.id, "again", "eng")
            .unwrap_err();
        assert_eq!(err.to_string(), "Only released documents can be revised");
    }

    #[test]
    fn test_obsolete_then_archive() {
        let mut engine = engine();
        let t = tenant("acme");
        let old = released(&mut engine);
        let new = draft(&mut engine, DocumentType::Procedure, "Replacement");

        let err = engine.archive_document(&t, &old.id).unwrap_err();
        assert_eq!(err.to_string(), "Only obsolete documents can be archived");

        let missing = EntityId::new(crate::core::identity::EntityPrefix::Doc);
        assert!(engine
            .obsolete_document(&t, &old.id, "replaced", Some(missing))
            .unwrap_err()
            .is_not_found());

        let old = engine
            .obsolete_document(&t, &old.id, "replaced", Some(new.id.clone()))
            .unwrap();
        assert_eq!(old.superseded_by.as_ref(), Some(&new.id));

        let old = engine.archive_document(&t, &old.id).unwrap();
        assert_eq!(old.status, DocumentStatus::Archived);
    }

    #[test]
    fn test_list_search_and_filters() {
        let mut engine = engine();
        let t = tenant("acme");
        draft(&mut engine, DocumentType::Procedure, "Calibration control");
        draft(&mut engine, DocumentType::WorkInstruction, "Torque sequence");

        let hits = engine
            .list_documents(
                &t,
                &DocumentFilter {
                    search: Some("torque".to_string()),
                    ..DocumentFilter::default()
                },
            )
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document_number, "WI-00001");

        let procedures = engine
            .list_documents(
                &t,
                &DocumentFilter {
                    document_type: Some(DocumentType::Procedure),
                    status: Some(DocumentStatus::Draft),
                    ..DocumentFilter::default()
                },
            )
            .unwrap();
        assert_eq!(procedures.len(), 1);
        assert!(engine
            .list_documents(&tenant("globex"), &DocumentFilter::default())
            .unwrap()
            .is_empty());
    }
}
