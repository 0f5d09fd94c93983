use common::reconcile::export::BOM;
use common::requests::ExportRequest;
use common::schema::slugify;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api;
use crate::components::form::SaveTarget;
use crate::helpers::{save_file, show_toast};

use super::messages::Msg;
use super::state::{resolved_fields, Editor, RecordsComponent};
use super::{load_detail, load_page};

pub fn update(component: &mut RecordsComponent, ctx: &Context<RecordsComponent>, msg: Msg) -> bool {
    match msg {
        Msg::DetailLoaded(Ok(detail)) => {
            component.fields = resolved_fields(&detail);
            component.detail = Some(detail);
            true
        }
        Msg::DetailLoaded(Err(err)) => {
            show_toast(&err.message);
            true
        }
        Msg::PageLoaded(Ok(page)) => {
            component.loading = false;
            component.page = page.page;
            component.page_size = page.page_size;
            component.records = page.records;
            true
        }
        Msg::PageLoaded(Err(err)) => {
            component.loading = false;
            show_toast(&err.message);
            true
        }
        Msg::ChangePage(page) => {
            component.loading = true;
            load_page(component, ctx, page);
            true
        }
        Msg::OpenNew => {
            component.editor = Some(Editor {
                target: SaveTarget::Create {
                    module_id: ctx.props().module_id,
                },
                initial: Default::default(),
            });
            true
        }
        Msg::OpenEdit(record) => {
            component.editor = Some(Editor {
                target: SaveTarget::Edit {
                    version_id: record.version.id,
                },
                initial: record.version.content,
            });
            true
        }
        Msg::CloseForm => {
            component.editor = None;
            true
        }
        Msg::Saved => {
            component.editor = None;
            // Reference options may list the record just saved.
            load_detail(component, ctx);
            load_page(component, ctx, component.page);
            true
        }
        Msg::Delete(master_id) => {
            let confirmed = web_sys::window()
                .and_then(|w| w.confirm_with_message("Excluir este registro e todo o seu histórico?").ok())
                .unwrap_or(false);
            if !confirmed || component.deleting.is_some() {
                return false;
            }
            component.deleting = Some(master_id);
            let link = ctx.link().clone();
            let alive = component.alive.clone();
            spawn_local(async move {
                let result = api::delete(&format!("/api/records/master/{}", master_id)).await;
                alive.send(&link, Msg::Deleted(result));
            });
            true
        }
        Msg::Deleted(result) => {
            component.deleting = None;
            match result {
                Ok(()) => {
                    show_toast("Registro excluído");
                    load_page(component, ctx, component.page);
                }
                Err(err) => show_toast(&err.message),
            }
            true
        }
        Msg::Export => {
            if component.exporting {
                return false;
            }
            component.exporting = true;
            let request = ExportRequest {
                module_id: ctx.props().module_id,
                fields: component.fields.iter().map(|f| f.name().to_string()).collect(),
            };
            let link = ctx.link().clone();
            let alive = component.alive.clone();
            spawn_local(async move {
                let result = api::post_for_bytes("/api/data_sources/csv/export", &request).await;
                alive.send(&link, Msg::Exported(result));
            });
            true
        }
        Msg::Exported(result) => {
            component.exporting = false;
            match result {
                Ok(mut bytes) => {
                    if !bytes.starts_with(BOM.as_bytes()) {
                        bytes.splice(0..0, BOM.bytes());
                    }
                    let name = component
                        .detail
                        .as_ref()
                        .map(|d| slugify(&d.module.name))
                        .unwrap_or_else(|| "registros".to_string());
                    if save_file(&format!("{}.csv", name), &bytes, "text/csv;charset=utf-8").is_err() {
                        show_toast("Não foi possível salvar o arquivo");
                    }
                }
                Err(err) => show_toast(&err.message),
            }
            true
        }
    }
}
