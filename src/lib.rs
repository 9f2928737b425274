pub mod shared {
    pub mod infrastructure {
        pub mod engine;
    }
}

pub mod modules {
    pub mod hello_world {
        pub mod core {
            pub mod body;
        }
        pub mod use_cases {
            pub mod enable_diagnostics {
                pub mod configure;
            }
            pub mod hello_world_route {
                pub mod route;
            }
        }
    }
    pub mod management {
        pub mod inbound {
            pub mod http;
        }
    }
}

pub mod shell;
