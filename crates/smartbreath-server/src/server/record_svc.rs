//! `RecordService` gRPC implementation.
//!
//! Record creation is authenticated but deliberately not ownership-gated:
//! ingestion clients (service-class credentials) insert measurements for any
//! existing machine. Reads carry the service bypass; deletion and report
//! rendering are owner-only.

use tonic::{Request, Response, Status};
use tracing::{info, instrument, warn};

use smartbreath_core::Vitals;
use smartbreath_core::pagination::Page;

use smartbreath_proto::v1::record_service_server::RecordService;
use smartbreath_proto::v1::{
    CreateRecordRequest, CreateRecordResponse, DeleteRecordRequest, DeleteRecordResponse,
    GetRecordRequest, GetRecordResponse, ListRecordsRequest, ListRecordsResponse, RecordInfo,
    RenderReportRequest, RenderReportResponse,
};

use crate::access::Access;
use crate::report;
use crate::server::grpc_util::{
    db_error_to_status, principal, require, timestamp, validation_to_status,
};
use crate::server::machine_svc::machine_row_to_proto;
use crate::storage::{Database, Record, RecordQuery};

pub struct RecordServiceImpl {
    db: Database,
}

impl RecordServiceImpl {
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn record_to_proto(r: &Record) -> RecordInfo {
    RecordInfo {
        id: r.id.clone(),
        machine_id: r.machine_id.clone(),
        spo2: r.spo2 as i32,
        fev1: r.fev1,
        fvc: r.fvc,
        pef: r.pef,
        fev1_fvc: r.fev1_fvc,
        measured_at: Some(timestamp(r.measured_at)),
        created_at: Some(timestamp(r.created_at)),
        updated_at: Some(timestamp(r.updated_at)),
    }
}

#[tonic::async_trait]
impl RecordService for RecordServiceImpl {
    #[instrument(skip(self, request), fields(rpc = "CreateRecord"))]
    async fn create_record(
        &self,
        request: Request<CreateRecordRequest>,
    ) -> Result<Response<CreateRecordResponse>, Status> {
        let req = request.into_inner();

        let vitals = Vitals {
            spo2: i64::from(req.spo2),
            fev1: req.fev1,
            fvc: req.fvc,
            pef: req.pef,
        };
        vitals.validate().map_err(validation_to_status)?;

        self.db
            .get_machine(&req.machine_id)
            .await
            .map_err(db_error_to_status)?;

        let record_id = uuid::Uuid::new_v4().to_string();
        let record = self
            .db
            .create_record(&record_id, &req.machine_id, &vitals, req.measured_at)
            .await
            .map_err(db_error_to_status)?;

        // Liveness heartbeat on the parent machine. Best-effort: a failure
        // here must not undo the stored record.
        if let Err(e) = self.db.touch_machine(&req.machine_id).await {
            warn!(error = %e, machine_id = %req.machine_id, "Machine touch failed after record creation");
        }

        info!(record_id = %record.id, machine_id = %req.machine_id, "Record created");

        Ok(Response::new(CreateRecordResponse {
            record: Some(record_to_proto(&record)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "ListRecords"))]
    async fn list_records(
        &self,
        request: Request<ListRecordsRequest>,
    ) -> Result<Response<ListRecordsResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        let machine = self
            .db
            .get_machine(&req.machine_id)
            .await
            .map_err(db_error_to_status)?;

        require(
            &caller,
            Access::RecordRead {
                owner_id: machine.owner_id.as_deref(),
            },
        )?;

        let query = RecordQuery::normalize(
            req.page,
            req.page_size,
            &req.sort_by,
            &req.order,
            req.from,
            req.to,
        );

        let (records, total) = self
            .db
            .list_records(&req.machine_id, &query)
            .await
            .map_err(db_error_to_status)?;

        let page = Page::new(query.page, u64::try_from(total).unwrap_or(0), records);

        Ok(Response::new(ListRecordsResponse {
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            total_count: u32::try_from(page.total_count).unwrap_or(u32::MAX),
            has_next: page.has_next,
            has_prev: page.has_prev,
            records: page.items.iter().map(record_to_proto).collect(),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "GetRecord"))]
    async fn get_record(
        &self,
        request: Request<GetRecordRequest>,
    ) -> Result<Response<GetRecordResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        let (record, machine) = self
            .db
            .get_record_with_machine(&req.record_id)
            .await
            .map_err(db_error_to_status)?;

        require(
            &caller,
            Access::RecordRead {
                owner_id: machine.owner_id.as_deref(),
            },
        )?;

        Ok(Response::new(GetRecordResponse {
            record: Some(record_to_proto(&record)),
            machine: Some(machine_row_to_proto(&machine)),
        }))
    }

    #[instrument(skip(self, request), fields(rpc = "DeleteRecord"))]
    async fn delete_record(
        &self,
        request: Request<DeleteRecordRequest>,
    ) -> Result<Response<DeleteRecordResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        let (record, machine) = self
            .db
            .get_record_with_machine(&req.record_id)
            .await
            .map_err(db_error_to_status)?;

        require(
            &caller,
            Access::RecordDelete {
                owner_id: machine.owner_id.as_deref(),
            },
        )?;

        let deleted = self
            .db
            .delete_record(&record.id)
            .await
            .map_err(db_error_to_status)?;

        if !deleted {
            return Err(Status::not_found(format!("Record {} not found", record.id)));
        }

        info!(record_id = %record.id, "Record deleted");

        Ok(Response::new(DeleteRecordResponse { deleted }))
    }

    #[instrument(skip(self, request), fields(rpc = "RenderReport"))]
    async fn render_report(
        &self,
        request: Request<RenderReportRequest>,
    ) -> Result<Response<RenderReportResponse>, Status> {
        let caller = principal(&request)?;
        let req = request.into_inner();

        let (record, machine) = self
            .db
            .get_record_with_machine(&req.record_id)
            .await
            .map_err(db_error_to_status)?;

        require(
            &caller,
            Access::MachineOwner {
                owner_id: machine.owner_id.as_deref(),
            },
        )?;

        let owner = match &machine.owner_id {
            Some(id) => Some(self.db.get_user(id).await.map_err(db_error_to_status)?),
            None => None,
        };

        let pdf = report::render_record_report(&record, &machine, owner.as_ref()).map_err(|e| {
            warn!(error = %e, record_id = %record.id, "Report rendering failed");
            Status::internal("Report rendering failed")
        })?;

        Ok(Response::new(RenderReportResponse {
            pdf,
            file_name: format!("smartbreath-record-{}.pdf", record.id),
        }))
    }
}
