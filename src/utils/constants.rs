//Backend defaults
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const USERS_PATH: &str = "/api/users";
pub const MESSAGE_PATH: &str = "/api/message";

//Launch query keys
pub const START_PARAM_KEY: &str = "startapp";
pub const USER_ID_KEY: &str = "user_id";

//Raw init data is forwarded so the backend can validate the caller
pub const INIT_DATA_HEADER: &str = "X-Telegram-Web-App-Init-Data";

//Time in seconds
pub const REQUEST_TIMEOUT: u64 = 10;

//Debug trace retention
pub const DEBUG_LOG_CAPACITY: usize = 50;

//Greeting fallback when the host supplies no identity
pub const FALLBACK_GREETING_NAME: &str = "friend";

//IPC
pub const DEFAULT_IPC_PORT: &str = "7878";

//Test
pub const TEST_IPC_PORT: &str = "7979";
