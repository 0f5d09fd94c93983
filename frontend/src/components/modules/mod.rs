use common::model::module::Module;
use common::model::profile::Role;
use common::requests::SessionInfo;
use uuid::Uuid;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api::{self, ApiError};
use crate::helpers::{show_toast, Liveness};

#[derive(Properties, PartialEq)]
pub struct ModuleListProps {
    pub on_open: Callback<Uuid>,
    pub on_import: Callback<Uuid>,
}

pub enum Msg {
    Loaded(Result<Vec<Module>, ApiError>),
}

pub struct ModuleListComponent {
    modules: Option<Vec<Module>>,
    role: Role,
    alive: Liveness,
}

impl Component for ModuleListComponent {
    type Message = Msg;
    type Properties = ModuleListProps;

    fn create(ctx: &Context<Self>) -> Self {
        let role = ctx
            .link()
            .context::<SessionInfo>(Callback::noop())
            .map(|(info, _)| info.role())
            .unwrap_or(Role::ReadOnly);
        let alive = Liveness::new();

        let link = ctx.link().clone();
        let task_alive = alive.clone();
        spawn_local(async move {
            let result = api::get::<Vec<Module>>("/api/modules").await;
            task_alive.send(&link, Msg::Loaded(result));
        });

        ModuleListComponent {
            modules: None,
            role,
            alive,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(Ok(modules)) => {
                self.modules = Some(modules);
                true
            }
            Msg::Loaded(Err(err)) => {
                show_toast(&err.message);
                self.modules = Some(Vec::new());
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let Some(modules) = &self.modules else {
            return html! { <p>{"Carregando módulos..."}</p> };
        };
        if modules.is_empty() {
            return html! { <p>{"Nenhum módulo disponível."}</p> };
        }
        let props = ctx.props();
        html! {
            <div>
                { for modules.iter().map(|module| {
                    let id = module.id;
                    let on_open = props.on_open.reform(move |_: MouseEvent| id);
                    let on_import = props.on_import.reform(move |_: MouseEvent| id);
                    html! {
                        <div class="card" key={id.to_string()}>
                            <h3>{ &module.name }</h3>
                            <p>{ module.description.clone().unwrap_or_default() }</p>
                            <button class="icon-btn" onclick={on_open}>
                                <i class="material-icons">{"table_view"}</i>{"Abrir"}
                            </button>
                            if self.role != Role::ReadOnly {
                                <button class="icon-btn" onclick={on_import}>
                                    <i class="material-icons">{"upload_file"}</i>{"Importar CSV"}
                                </button>
                            }
                        </div>
                    }
                }) }
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.alive.end();
    }
}
