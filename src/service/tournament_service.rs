use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api_error::ApiError;
use crate::auth::Identity;
use crate::engine::{self, ComputedStandings, Propagation};
use crate::models::*;
use crate::repository::Repository;
use crate::service::store::Store;

/// Players per generated group.
pub const GROUP_SIZE: usize = 4;

fn new_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..10])
}

fn match_prefix(phase: Phase) -> &'static str {
    match phase {
        Phase::Group => "mg",
        Phase::Elimination => "me",
    }
}

/// Store `sets` on the match and derive its winner from them.
fn apply_sets(m: &mut Match, sets: [SetScore; SETS_PER_MATCH]) {
    m.sets = sets;
    let winner = engine::evaluate(&m.sets)
        .map(|slot| m.player(slot).to_string())
        .filter(|id| !id.is_empty());
    m.winner = winner;
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

/// Tournament progression for both categories.
pub struct TournamentService<R> {
    store: Store<R>,
}

impl<R: Repository> TournamentService<R> {
    pub fn new(store: Store<R>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store<R> {
        &self.store
    }

    // =============================================================================
    // PLAYERS
    // =============================================================================

    pub async fn list_players(&self, category: Category) -> Result<Vec<Competitor>, ApiError> {
        let doc: PlayersDocument = self.store.load(category, DocumentKind::Players).await?;
        Ok(doc.players)
    }

    pub async fn create_player(
        &self,
        identity: &Identity,
        category: Category,
        dto: CreatePlayerRequest,
    ) -> Result<Competitor, ApiError> {
        identity.require_admin()?;
        dto.validate()?;

        let competitor = Competitor {
            id: new_id("p"),
            category,
            name: dto.name.trim().to_string(),
            surname: dto.surname.trim().to_string(),
        };

        self.store
            .modify(category, DocumentKind::Players, |doc: &mut PlayersDocument| {
                doc.players.push(competitor.clone());
                Ok(())
            })
            .await?;

        info!(category = %category, player_id = %competitor.id, "Player registered");
        Ok(competitor)
    }

    // =============================================================================
    // GROUPS
    // =============================================================================

    pub async fn list_groups(&self, category: Category) -> Result<Vec<Group>, ApiError> {
        let doc: GroupsDocument = self.store.load(category, DocumentKind::Groups).await?;
        Ok(doc.groups)
    }

    /// Split registered players, in registration order, into groups of four and
    /// schedule a round robin inside each. Replaces existing groups, group
    /// matches and standings.
    pub async fn generate_groups(
        &self,
        identity: &Identity,
        category: Category,
    ) -> Result<GeneratedGroups, ApiError> {
        identity.require_admin()?;

        let players: PlayersDocument = self.store.load(category, DocumentKind::Players).await?;
        if players.players.is_empty() {
            return Err(ApiError::invalid_input("no players to group"));
        }

        let ids: Vec<String> = players.players.iter().map(|p| p.id.clone()).collect();
        let groups: Vec<Group> = ids
            .chunks(GROUP_SIZE)
            .enumerate()
            .map(|(i, chunk)| Group {
                id: format!("G{}", i + 1),
                players: chunk.to_vec(),
            })
            .collect();

        let mut matches = Vec::new();
        for group in &groups {
            for (i, p1) in group.players.iter().enumerate() {
                for p2 in &group.players[i + 1..] {
                    let mut m = Match::scheduled(new_id("mg"), category, Phase::Group, p1, p2);
                    m.group_id = Some(group.id.clone());
                    matches.push(m);
                }
            }
        }
        let matches_created = matches.len();
        let standings = engine::compute_standings(&players.players, &groups, &[]);

        self.store
            .replace(
                category,
                DocumentKind::Groups,
                GroupsDocument { groups: groups.clone(), ..Default::default() },
            )
            .await?;
        self.store
            .replace(
                category,
                DocumentKind::GroupMatches,
                MatchesDocument { matches, ..Default::default() },
            )
            .await?;
        self.store
            .replace(category, DocumentKind::Standings, standings_document(standings))
            .await?;

        info!(
            category = %category,
            groups = groups.len(),
            matches_created,
            "Groups generated"
        );
        Ok(GeneratedGroups { groups, matches_created })
    }

    /// Create a group, or overwrite the member list of an existing one.
    pub async fn upsert_group(
        &self,
        identity: &Identity,
        category: Category,
        group_id: &str,
        dto: UpsertGroupRequest,
    ) -> Result<Group, ApiError> {
        identity.require_admin()?;
        dto.validate()?;

        let group_id = group_id.trim();
        if group_id.is_empty() {
            return Err(ApiError::invalid_input("group id required"));
        }
        let mut players: Vec<String> = Vec::with_capacity(dto.players.len());
        for player in dto.players.iter().map(|p| p.trim()) {
            if player.is_empty() {
                return Err(ApiError::invalid_input("player ids must not be empty"));
            }
            if players.iter().any(|p| p == player) {
                return Err(ApiError::invalid_input(format!("player '{}' listed twice", player)));
            }
            players.push(player.to_string());
        }
        let group = Group { id: group_id.to_string(), players };

        self.store
            .modify(category, DocumentKind::Groups, |doc: &mut GroupsDocument| {
                match doc.groups.iter_mut().find(|g| g.id == group.id) {
                    Some(existing) => *existing = group.clone(),
                    None => doc.groups.push(group.clone()),
                }
                Ok(())
            })
            .await?;

        info!(category = %category, group_id = %group.id, players = group.players.len(), "Group saved");
        Ok(group)
    }

    // =============================================================================
    // MATCHES
    // =============================================================================

    pub async fn list_matches(
        &self,
        category: Category,
        phase: Option<Phase>,
    ) -> Result<Vec<Match>, ApiError> {
        let mut matches = Vec::new();
        for phase in phases(phase) {
            let doc: MatchesDocument = self.store.load(category, DocumentKind::matches(phase)).await?;
            matches.extend(doc.matches);
        }
        Ok(matches)
    }

    /// Phase whose match list holds `match_id`.
    async fn locate(
        &self,
        category: Category,
        match_id: &str,
        phase: Option<Phase>,
    ) -> Result<Phase, ApiError> {
        for phase in phases(phase) {
            let doc: MatchesDocument = self.store.load(category, DocumentKind::matches(phase)).await?;
            if doc.find(match_id).is_some() {
                return Ok(phase);
            }
        }
        Err(ApiError::not_found(format!("match '{}'", match_id)))
    }

    pub async fn create_match(
        &self,
        identity: &Identity,
        category: Category,
        dto: CreateMatchRequest,
    ) -> Result<Match, ApiError> {
        identity.require_admin()?;
        dto.validate()?;

        let (p1, p2) = (dto.p1.trim(), dto.p2.trim());
        if p1 == p2 {
            return Err(ApiError::invalid_input("p1 and p2 must be different"));
        }
        let group_id = trimmed(dto.group_id.as_deref());
        if dto.phase == Phase::Group && group_id.is_none() {
            return Err(ApiError::invalid_input("groupId required for group phase"));
        }
        let sets = match dto.sets.as_deref() {
            Some(raw) => engine::normalize_sets(raw)?,
            None => [SetScore::default(); SETS_PER_MATCH],
        };

        let id = trimmed(dto.id.as_deref()).unwrap_or_else(|| new_id(match_prefix(dto.phase)));
        let mut created = Match::scheduled(id, category, dto.phase, p1, p2);
        created.status = dto.status;
        apply_sets(&mut created, sets);
        match dto.phase {
            Phase::Group => created.group_id = group_id,
            Phase::Elimination => {
                created.round_name = trimmed(dto.round_name.as_deref());
                created.advances_to = dto.advances_to.clone();
            }
        }
        created.scheduled_at = dto.scheduled_at;
        created.updated_by = Some(identity.subject.clone());

        self.store
            .modify(category, DocumentKind::matches(dto.phase), |doc: &mut MatchesDocument| {
                if doc.find(&created.id).is_some() {
                    return Err(ApiError::conflict(format!("match '{}' already exists", created.id)));
                }
                doc.matches.push(created.clone());
                reject_cycles(&doc.matches)
            })
            .await?;

        info!(
            category = %category,
            match_id = %created.id,
            phase = %created.phase,
            "Match created"
        );
        self.after_match_write(&created).await?;
        Ok(created)
    }

    /// Administrative edit. `dto.phase` only narrows the lookup; a match never
    /// changes phase. The winner is re-derived from the resulting sets.
    pub async fn update_match(
        &self,
        identity: &Identity,
        category: Category,
        match_id: &str,
        dto: UpdateMatchRequest,
    ) -> Result<Match, ApiError> {
        identity.require_admin()?;
        dto.validate()?;
        let sets = dto.sets.as_deref().map(engine::normalize_sets).transpose()?;

        let phase = self.locate(category, match_id, dto.phase).await?;
        let (_, updated) = self
            .store
            .modify(category, DocumentKind::matches(phase), |doc: &mut MatchesDocument| {
                let m = doc
                    .find_mut(match_id)
                    .ok_or_else(|| ApiError::not_found(format!("match '{}'", match_id)))?;

                if let Some(p1) = &dto.p1 {
                    m.p1 = p1.trim().to_string();
                }
                if let Some(p2) = &dto.p2 {
                    m.p2 = p2.trim().to_string();
                }
                if !m.p1.is_empty() && m.p1 == m.p2 {
                    return Err(ApiError::invalid_input("p1 and p2 must be different"));
                }
                if let Some(status) = dto.status {
                    m.status = status;
                }
                if let Some(round_name) = &dto.round_name {
                    m.round_name = trimmed(Some(round_name.as_str()));
                }
                if let Some(group_id) = &dto.group_id {
                    m.group_id = trimmed(group_id.as_deref());
                }
                if let Some(scheduled_at) = dto.scheduled_at {
                    m.scheduled_at = scheduled_at;
                }
                if let Some(advances_to) = &dto.advances_to {
                    m.advances_to = advances_to.clone();
                }
                let sets = sets.unwrap_or(m.sets);
                apply_sets(m, sets);
                m.updated_by = Some(identity.subject.clone());

                let updated = m.clone();
                reject_cycles(&doc.matches)?;
                Ok(updated)
            })
            .await?;

        info!(category = %category, match_id = %match_id, "Match updated");
        self.after_match_write(&updated).await?;
        Ok(updated)
    }

    pub async fn delete_match(
        &self,
        identity: &Identity,
        category: Category,
        match_id: &str,
        phase: Option<Phase>,
    ) -> Result<(), ApiError> {
        identity.require_admin()?;

        let phase = self.locate(category, match_id, phase).await?;
        self.store
            .modify(category, DocumentKind::matches(phase), |doc: &mut MatchesDocument| {
                let position = doc
                    .matches
                    .iter()
                    .position(|m| m.id == match_id)
                    .ok_or_else(|| ApiError::not_found(format!("match '{}'", match_id)))?;
                doc.matches.remove(position);
                Ok(())
            })
            .await?;

        info!(category = %category, match_id = %match_id, phase = %phase, "Match deleted");
        if phase == Phase::Group {
            self.refresh_standings(category).await;
        }
        Ok(())
    }

    // =============================================================================
    // SCORING
    // =============================================================================

    /// Record a result. Input is validated and the caller's right to score the
    /// match is checked before anything is written.
    pub async fn update_score(
        &self,
        identity: &Identity,
        category: Category,
        match_id: &str,
        dto: UpdateScoreRequest,
    ) -> Result<Match, ApiError> {
        let sets = engine::normalize_sets(&dto.sets)?;
        let kind = DocumentKind::matches(dto.phase);

        let current: MatchesDocument = self.store.load(category, kind).await?;
        let existing = current
            .find(match_id)
            .ok_or_else(|| ApiError::not_found(format!("match '{}'", match_id)))?;
        if !identity.can_score(existing) {
            warn!(
                subject = %identity.subject,
                match_id = %match_id,
                "Score update rejected: caller does not play in this match"
            );
            return Err(ApiError::Forbidden);
        }

        let (_, updated) = self
            .store
            .modify(category, kind, |doc: &mut MatchesDocument| {
                let m = doc
                    .find_mut(match_id)
                    .ok_or_else(|| ApiError::not_found(format!("match '{}'", match_id)))?;
                // Players may have changed since the check above.
                if !identity.can_score(m) {
                    return Err(ApiError::Forbidden);
                }
                apply_sets(m, sets);
                m.status = dto.status;
                m.updated_by = Some(identity.subject.clone());
                Ok(m.clone())
            })
            .await?;

        info!(
            category = %category,
            match_id = %match_id,
            status = %updated.status,
            winner = ?updated.winner,
            updated_by = %identity.subject,
            "Score recorded"
        );
        self.after_match_write(&updated).await?;
        Ok(updated)
    }

    async fn after_match_write(&self, m: &Match) -> Result<(), ApiError> {
        match m.phase {
            Phase::Group => self.refresh_standings(m.category).await,
            Phase::Elimination => {
                self.advance(m).await?;
            }
        }
        Ok(())
    }

    // =============================================================================
    // ADVANCEMENT
    // =============================================================================

    /// Push `source`'s winner one hop down the bracket. A missing downstream
    /// match is logged and skipped.
    pub async fn advance(&self, source: &Match) -> Result<Propagation, ApiError> {
        let category = source.category;
        let kind = DocumentKind::EliminationMatches;

        let mut preview: MatchesDocument = self.store.load(category, kind).await?;
        let outcome = engine::propagate(source, &mut preview.matches);
        let outcome = if outcome.changed() {
            let (_, outcome) = self
                .store
                .modify(category, kind, |doc: &mut MatchesDocument| {
                    Ok(engine::propagate(source, &mut doc.matches))
                })
                .await?;
            outcome
        } else {
            outcome
        };

        match &outcome {
            Propagation::Advanced { match_id, slot, player_id } => info!(
                source = %source.id,
                target = %match_id,
                slot = %slot,
                player_id = %player_id,
                "Winner advanced"
            ),
            Propagation::MissingTarget { match_id } => warn!(
                source = %source.id,
                target = %match_id,
                "Downstream match not found; advancement skipped"
            ),
            other => debug!(source = %source.id, outcome = ?other, "Nothing to advance"),
        }
        Ok(outcome)
    }

    // =============================================================================
    // STANDINGS
    // =============================================================================

    async fn current_standings(&self, category: Category) -> Result<ComputedStandings, ApiError> {
        let players: PlayersDocument = self.store.load(category, DocumentKind::Players).await?;
        let groups: GroupsDocument = self.store.load(category, DocumentKind::Groups).await?;
        let matches: MatchesDocument = self.store.load(category, DocumentKind::GroupMatches).await?;
        Ok(engine::compute_standings(&players.players, &groups.groups, &matches.matches))
    }

    async fn recompute_standings(&self, category: Category) -> Result<StandingsDocument, ApiError> {
        let computed = self.current_standings(category).await?;
        let doc = self
            .store
            .replace(category, DocumentKind::Standings, standings_document(computed))
            .await?;
        debug!(category = %category, version = doc.revision.version, "Standings recomputed");
        Ok(doc)
    }

    /// Best-effort recomputation after a group result changes. A failure leaves
    /// the previous standings in place until the next recomputation.
    async fn refresh_standings(&self, category: Category) {
        if let Err(e) = self.recompute_standings(category).await {
            warn!(category = %category, error = %e, "Standings refresh failed");
        }
    }

    pub async fn compute_standings(
        &self,
        identity: &Identity,
        category: Category,
    ) -> Result<StandingsDocument, ApiError> {
        identity.require_admin()?;
        let doc = self.recompute_standings(category).await?;
        info!(category = %category, rows = doc.overall.len(), "Standings computed");
        Ok(doc)
    }

    pub async fn get_standings(&self, category: Category) -> Result<StandingsDocument, ApiError> {
        self.store.load(category, DocumentKind::Standings).await
    }

    // =============================================================================
    // BRACKET
    // =============================================================================

    /// Seed the elimination bracket from the current group results. Replaces
    /// any existing elimination matches.
    pub async fn seed_bracket(
        &self,
        identity: &Identity,
        category: Category,
    ) -> Result<SeededBracketResponse, ApiError> {
        identity.require_admin()?;

        let standings = self.current_standings(category).await?;
        let seeded = engine::seed_bracket(category, &standings.groups, || new_id("me"))?;
        let matches_created = seeded.matches.len();

        self.store
            .replace(
                category,
                DocumentKind::EliminationMatches,
                MatchesDocument { matches: seeded.matches, ..Default::default() },
            )
            .await?;
        let bracket = self
            .store
            .replace(
                category,
                DocumentKind::Bracket,
                BracketDocument {
                    seeds: seeded.seeds,
                    rounds: seeded.rounds,
                    ..Default::default()
                },
            )
            .await?;

        info!(
            category = %category,
            rounds = bracket.rounds.len(),
            matches_created,
            "Bracket seeded"
        );
        Ok(SeededBracketResponse {
            seeds: bracket.seeds,
            rounds: bracket.rounds,
            matches_created,
        })
    }

    pub async fn get_bracket(&self, category: Category) -> Result<BracketDocument, ApiError> {
        self.store.load(category, DocumentKind::Bracket).await
    }
}

fn phases(phase: Option<Phase>) -> Vec<Phase> {
    match phase {
        Some(phase) => vec![phase],
        None => vec![Phase::Group, Phase::Elimination],
    }
}

fn standings_document(computed: ComputedStandings) -> StandingsDocument {
    StandingsDocument {
        overall: computed.overall,
        groups: computed.groups,
        ..Default::default()
    }
}

fn reject_cycles(matches: &[Match]) -> Result<(), ApiError> {
    match engine::find_cycle(matches) {
        Some(id) => Err(ApiError::invalid_input(format!(
            "advancement from '{}' leads back into itself",
            id
        ))),
        None => Ok(()),
    }
}
