//! Single binary web server: admin and public JSON API over an in-memory document store.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. See `tournament_desk::Config` for the environment overrides.

use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{
    cookie::Key,
    delete, get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tournament_desk::store::ParticipantPatch;
use tournament_desk::{
    create_bracket, submit_match_result, submit_match_score, AllocationFilter, AllocationStats,
    ApprovalStatus, BracketId, Caller, Category, Config, DocumentStore, Gender, Level,
    MemoryStore, Participant, ParticipantId, Role, ScoringFormat, SetScore, StoreError, Team,
    TeamAllocator, TeamId, TeamOrder, TournamentError, TournamentId,
};

/// Shared state: one document store for every tournament, plus configuration.
struct AppState {
    store: MemoryStore,
    config: Config,
}

type State = Data<AppState>;

/// Session key holding the signed-in caller.
const CALLER_KEY: &str = "caller";

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct SignInBody {
    id: String,
    role: Role,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    category: Category,
    gender: Gender,
    level: Level,
}

#[derive(Deserialize)]
struct StatusBody {
    status: ApprovalStatus,
    #[serde(default)]
    seed: Option<u32>,
}

#[derive(Deserialize)]
struct CreateTeamBody {
    name: String,
}

#[derive(Deserialize)]
struct WinnerBody {
    winner_id: ParticipantId,
}

#[derive(Deserialize)]
struct ScoreBody {
    scores: Vec<SetScore>,
    #[serde(default)]
    format: ScoringFormat,
}

#[derive(Deserialize)]
struct AssignBody {
    participant_id: ParticipantId,
    team_id: TeamId,
}

#[derive(Deserialize)]
struct OrderBody {
    order: Option<TeamOrder>,
}

/// Gender/level filter; absent or `all` selects everyone.
#[derive(Deserialize)]
struct FilterQuery {
    gender: Option<String>,
    level: Option<String>,
}

#[derive(Serialize)]
struct AllocationView {
    stats: AllocationStats,
    unassigned: Vec<Participant>,
    teams: Vec<Team>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and registration id
#[derive(Deserialize)]
struct RegistrationPath {
    id: TournamentId,
    participant_id: ParticipantId,
}

/// Path segments: tournament id and category (e.g. /api/tournaments/{id}/categories/{category})
#[derive(Deserialize)]
struct CategoryPath {
    id: TournamentId,
    category: String,
}

#[derive(Deserialize)]
struct BracketPath {
    id: BracketId,
}

/// Path segments: bracket id, round storage index, match index within the round
#[derive(Deserialize)]
struct BracketMatchPath {
    id: BracketId,
    round: usize,
    match_index: usize,
}

fn error_json(e: &TournamentError) -> serde_json::Value {
    serde_json::json!({ "error": e.to_string() })
}

fn error_response(e: &TournamentError) -> HttpResponse {
    use TournamentError::*;
    match e {
        Forbidden => HttpResponse::Forbidden().json(error_json(e)),
        BracketNotFound(_) | TeamNotFound(_) | ParticipantNotFound(_) | MatchNotFound { .. } => {
            HttpResponse::NotFound().json(error_json(e))
        }
        NoTeamsAvailable | EmptyUnassignedPool | AlreadyRostered { .. } | MatchNotReady { .. } => {
            HttpResponse::Conflict().json(error_json(e))
        }
        StoreWriteFailure(inner) => {
            log::error!("Store failure: {}", inner);
            HttpResponse::InternalServerError().json(error_json(e))
        }
        InsufficientParticipants { .. } | WinnerNotInMatch(_) | InvalidScore(_) => {
            HttpResponse::BadRequest().json(error_json(e))
        }
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

fn bad_request(msg: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": msg.into() }))
}

/// Caller stored in the session cookie, or an anonymous public caller.
fn session_caller(session: &Session) -> Caller {
    session
        .get::<Caller>(CALLER_KEY)
        .ok()
        .flatten()
        .unwrap_or_else(Caller::public)
}

/// Parse a filter value; `None` or `all` means no restriction.
fn parse_choice<T: DeserializeOwned>(raw: Option<&str>) -> Result<Option<T>, String> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => serde_json::from_value(serde_json::Value::String(value.to_string()))
            .map(Some)
            .map_err(|_| format!("Unknown filter value '{}'", value)),
    }
}

fn allocation_filter(category: &str, query: &FilterQuery) -> Result<AllocationFilter, HttpResponse> {
    let mut filter = AllocationFilter::new(Category::from(category));
    filter.gender = parse_choice(query.gender.as_deref()).map_err(bad_request)?;
    filter.level = parse_choice(query.level.as_deref()).map_err(bad_request)?;
    Ok(filter)
}

fn load_allocator<'s>(
    state: &'s AppState,
    path: &CategoryPath,
    query: &FilterQuery,
    caller: Caller,
) -> Result<TeamAllocator<'s, MemoryStore>, HttpResponse> {
    let filter = allocation_filter(&path.category, query)?;
    TeamAllocator::load(&state.store, path.id, filter, caller).map_err(|e| error_response(&e))
}

fn allocation_view(allocator: &TeamAllocator<'_, MemoryStore>) -> AllocationView {
    AllocationView {
        stats: allocator.stats(),
        unassigned: allocator.unassigned(),
        teams: allocator.teams().to_vec(),
    }
}

/// Run the draw right away, then hold its result until the wheel animation is over.
async fn commit_then_animate<T>(delay: Duration, draw: impl FnOnce() -> T) -> T {
    let result = draw();
    tokio::time::sleep(delay).await;
    result
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-desk",
    })
}

/// Open a session as the given caller. Admin roles need the configured token.
#[post("/api/session")]
async fn api_sign_in(state: State, session: Session, body: Json<SignInBody>) -> HttpResponse {
    let body = body.into_inner();
    if body.role != Role::Public {
        if let Some(expected) = &state.config.admin_token {
            if body.token.as_deref() != Some(expected.as_str()) {
                return error_response(&TournamentError::Forbidden);
            }
        }
    }
    let caller = Caller::new(body.id.trim(), body.role);
    if let Err(e) = session.insert(CALLER_KEY, &caller) {
        log::error!("Failed to write session: {}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({ "error": "session error" }));
    }
    log::info!("{} signed in as {:?}", caller.id, caller.role);
    HttpResponse::Ok().json(caller)
}

#[delete("/api/session")]
async fn api_sign_out(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// Public registration form. New registrations start pending.
#[post("/api/tournaments/{id}/registrations")]
async fn api_register(state: State, path: Path<TournamentPath>, body: Json<RegisterBody>) -> HttpResponse {
    let body = body.into_inner();
    if body.name.trim().is_empty() {
        return bad_request("Name is required");
    }
    let participant = Participant::new(path.id, body.name, body.category, body.gender, body.level);
    match state.store.create_participant(participant.clone()) {
        Ok(_) => HttpResponse::Created().json(participant),
        Err(e) => error_response(&TournamentError::from(e)),
    }
}

#[get("/api/tournaments/{id}/categories/{category}/registrations")]
async fn api_list_registrations(state: State, session: Session, path: Path<CategoryPath>) -> HttpResponse {
    let caller = session_caller(&session);
    respond(caller.require_admin().and_then(|_| {
        Ok(state
            .store
            .get_participants(path.id, &Category::from(path.category.as_str()))?)
    }))
}

/// Approve or reject a registration.
#[put("/api/tournaments/{id}/registrations/{participant_id}/status")]
async fn api_set_registration_status(
    state: State,
    session: Session,
    path: Path<RegistrationPath>,
    body: Json<StatusBody>,
) -> HttpResponse {
    let caller = session_caller(&session);
    if let Err(e) = caller.require_admin() {
        return error_response(&e);
    }
    let patch = ParticipantPatch {
        status: Some(body.status),
        seed: body.seed,
    };
    match state.store.update_participant(path.id, path.participant_id, patch) {
        Ok(p) => {
            log::info!("{} set {} to {:?}", caller.id, p.name, p.status);
            HttpResponse::Ok().json(p)
        }
        Err(StoreError::NotFound { .. }) => {
            error_response(&TournamentError::ParticipantNotFound(path.participant_id))
        }
        Err(e) => error_response(&TournamentError::from(e)),
    }
}

#[get("/api/tournaments/{id}/categories/{category}/teams")]
async fn api_list_teams(state: State, path: Path<CategoryPath>) -> HttpResponse {
    respond(
        state
            .store
            .get_teams(path.id, &Category::from(path.category.as_str()))
            .map_err(TournamentError::from),
    )
}

#[post("/api/tournaments/{id}/categories/{category}/teams")]
async fn api_create_team(
    state: State,
    session: Session,
    path: Path<CategoryPath>,
    body: Json<CreateTeamBody>,
) -> HttpResponse {
    let caller = session_caller(&session);
    if let Err(e) = caller.require_admin() {
        return error_response(&e);
    }
    let name = body.name.trim();
    if name.is_empty() {
        return bad_request("Team name is required");
    }
    let team = Team::new(path.id, Category::from(path.category.as_str()), name);
    match state.store.create_team(team.clone()) {
        Ok(_) => HttpResponse::Created().json(team),
        Err(e) => error_response(&TournamentError::from(e)),
    }
}

#[get("/api/tournaments/{id}/categories/{category}/brackets")]
async fn api_list_brackets(state: State, path: Path<CategoryPath>) -> HttpResponse {
    respond(
        state
            .store
            .list_brackets(path.id, &Category::from(path.category.as_str()))
            .map_err(TournamentError::from),
    )
}

/// Generate a bracket from the approved registrations of a category.
#[post("/api/tournaments/{id}/categories/{category}/brackets")]
async fn api_generate_bracket(state: State, session: Session, path: Path<CategoryPath>) -> HttpResponse {
    let caller = session_caller(&session);
    let category = Category::from(path.category.as_str());
    match create_bracket(&state.store, path.id, &category, state.config.ready_policy, &caller) {
        Ok(bracket) => HttpResponse::Created().json(bracket),
        Err(e) => error_response(&e),
    }
}

#[get("/api/brackets/{id}")]
async fn api_get_bracket(state: State, path: Path<BracketPath>) -> HttpResponse {
    match state.store.get_bracket(path.id) {
        Ok(Some(bracket)) => HttpResponse::Ok().json(bracket),
        Ok(None) => error_response(&TournamentError::BracketNotFound(path.id)),
        Err(e) => error_response(&TournamentError::from(e)),
    }
}

#[put("/api/brackets/{id}/rounds/{round}/matches/{match_index}/winner")]
async fn api_set_match_winner(
    state: State,
    session: Session,
    path: Path<BracketMatchPath>,
    body: Json<WinnerBody>,
) -> HttpResponse {
    let caller = session_caller(&session);
    respond(submit_match_result(
        &state.store,
        path.id,
        path.round,
        path.match_index,
        body.winner_id,
        &caller,
    ))
}

#[put("/api/brackets/{id}/rounds/{round}/matches/{match_index}/score")]
async fn api_set_match_score(
    state: State,
    session: Session,
    path: Path<BracketMatchPath>,
    body: Json<ScoreBody>,
) -> HttpResponse {
    let caller = session_caller(&session);
    respond(submit_match_score(
        &state.store,
        path.id,
        path.round,
        path.match_index,
        &body.scores,
        body.format,
        &caller,
    ))
}

/// Stats, unassigned pool and rosters for the allocation screen.
#[get("/api/tournaments/{id}/categories/{category}/allocation")]
async fn api_allocation(
    state: State,
    path: Path<CategoryPath>,
    query: Query<FilterQuery>,
) -> HttpResponse {
    match load_allocator(&state, &path, &query, Caller::public()) {
        Ok(allocator) => HttpResponse::Ok().json(allocation_view(&allocator)),
        Err(resp) => resp,
    }
}

#[post("/api/tournaments/{id}/categories/{category}/allocation/assign")]
async fn api_assign(
    state: State,
    session: Session,
    path: Path<CategoryPath>,
    query: Query<FilterQuery>,
    body: Json<AssignBody>,
) -> HttpResponse {
    let mut allocator = match load_allocator(&state, &path, &query, session_caller(&session)) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    respond(allocator.assign_one(body.participant_id, body.team_id))
}

/// Spin the wheel once: commits the draw, then holds the response for the wheel animation.
#[post("/api/tournaments/{id}/categories/{category}/allocation/spin")]
async fn api_spin(
    state: State,
    session: Session,
    path: Path<CategoryPath>,
    query: Query<FilterQuery>,
    body: Option<Json<OrderBody>>,
) -> HttpResponse {
    let caller = session_caller(&session);
    if let Err(e) = caller.require_admin() {
        return error_response(&e);
    }
    let order = body.and_then(|b| b.order).unwrap_or(TeamOrder::ByName);
    let mut allocator = match load_allocator(&state, &path, &query, caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let result = commit_then_animate(state.config.spin_delay, || {
        allocator.spin_one(&mut rand::thread_rng(), order)
    })
    .await;
    respond(result)
}

#[post("/api/tournaments/{id}/categories/{category}/allocation/spin-round")]
async fn api_spin_round(
    state: State,
    session: Session,
    path: Path<CategoryPath>,
    query: Query<FilterQuery>,
    body: Option<Json<OrderBody>>,
) -> HttpResponse {
    let caller = session_caller(&session);
    if let Err(e) = caller.require_admin() {
        return error_response(&e);
    }
    let order = body.and_then(|b| b.order).unwrap_or(TeamOrder::ByName);
    let mut allocator = match load_allocator(&state, &path, &query, caller) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let result = commit_then_animate(state.config.spin_delay, || {
        allocator.spin_round(&mut rand::thread_rng(), order)
    })
    .await;
    respond(result)
}

#[post("/api/tournaments/{id}/categories/{category}/allocation/auto-assign")]
async fn api_auto_assign(
    state: State,
    session: Session,
    path: Path<CategoryPath>,
    query: Query<FilterQuery>,
    body: Option<Json<OrderBody>>,
) -> HttpResponse {
    let mut allocator = match load_allocator(&state, &path, &query, session_caller(&session)) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    let order = body.and_then(|b| b.order).unwrap_or(TeamOrder::Insertion);
    respond(allocator.auto_assign_all(order))
}

#[post("/api/tournaments/{id}/categories/{category}/allocation/unassign-all")]
async fn api_unassign_all(
    state: State,
    session: Session,
    path: Path<CategoryPath>,
    query: Query<FilterQuery>,
) -> HttpResponse {
    let mut allocator = match load_allocator(&state, &path, &query, session_caller(&session)) {
        Ok(a) => a,
        Err(resp) => return resp,
    };
    match allocator.unassign_all() {
        Ok(removed) => HttpResponse::Ok().json(serde_json::json!({ "removed": removed })),
        Err(e) => error_response(&e),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    if config.admin_token.is_none() {
        log::warn!("ADMIN_TOKEN is not set: any caller may open an admin session");
    }
    let bind = (config.host.clone(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let secure_cookies = config.secure_cookies;
    let state = Data::new(AppState {
        store: MemoryStore::new(),
        config,
    });
    // Sessions do not survive a restart.
    let key = Key::generate();

    HttpServer::new(move || {
        App::new()
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(secure_cookies)
                    .build(),
            )
            .app_data(state.clone())
            .service(api_health)
            .service(api_sign_in)
            .service(api_sign_out)
            .service(api_register)
            .service(api_list_registrations)
            .service(api_set_registration_status)
            .service(api_list_teams)
            .service(api_create_team)
            .service(api_list_brackets)
            .service(api_generate_bracket)
            .service(api_get_bracket)
            .service(api_set_match_winner)
            .service(api_set_match_score)
            .service(api_allocation)
            .service(api_assign)
            .service(api_spin)
            .service(api_spin_round)
            .service(api_auto_assign)
            .service(api_unassign_all)
    })
    .bind(bind)?
    .run()
    .await
}
