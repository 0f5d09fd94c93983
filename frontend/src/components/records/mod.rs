//! Records screen: the current records of one module, paged, with the
//! dynamic form for creating and editing and a CSV download.

use common::requests::{ModuleDetail, RecordPage};
use uuid::Uuid;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api;

mod messages;
mod state;
mod update;
mod view;

pub use messages::Msg;
pub use state::RecordsComponent;

#[derive(Properties, PartialEq)]
pub struct RecordsProps {
    pub module_id: Uuid,
    pub on_import: Callback<Uuid>,
}

impl Component for RecordsComponent {
    type Message = Msg;
    type Properties = RecordsProps;

    fn create(ctx: &Context<Self>) -> Self {
        let component = RecordsComponent::new();
        load_detail(&component, ctx);
        load_page(&component, ctx, 0);
        component
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        if ctx.props().module_id != old_props.module_id {
            self.alive.end();
            *self = RecordsComponent::new();
            load_detail(self, ctx);
            load_page(self, ctx, 0);
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.alive.end();
    }
}

pub(crate) fn load_detail(component: &RecordsComponent, ctx: &Context<RecordsComponent>) {
    let link = ctx.link().clone();
    let alive = component.alive.clone();
    let path = format!("/api/modules/{}", ctx.props().module_id);
    spawn_local(async move {
        let result = api::get::<ModuleDetail>(&path).await;
        alive.send(&link, Msg::DetailLoaded(result));
    });
}

pub(crate) fn load_page(component: &RecordsComponent, ctx: &Context<RecordsComponent>, page: u32) {
    let link = ctx.link().clone();
    let alive = component.alive.clone();
    let path = format!("/api/records/{}?page={}", ctx.props().module_id, page);
    spawn_local(async move {
        let result = api::get::<RecordPage>(&path).await;
        alive.send(&link, Msg::PageLoaded(result));
    });
}
