//! Group and member operations

use rusqlite::{params, OptionalExtension};

use super::Store;
use crate::error::Result;
use crate::models::{ExpenseGroup, GroupCategory, MatchContext, Member};

impl Store {
    /// Insert or update a member
    pub fn upsert_member(&self, member: &Member) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO members (id, name, email) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email
            "#,
            params![member.id, member.name, member.email],
        )?;
        Ok(())
    }

    /// Insert a group with its member roster.
    ///
    /// Members must already exist; use [`upsert_member`](Self::upsert_member)
    /// first.
    pub fn insert_group(&self, group: &ExpenseGroup) -> Result<()> {
        let conn = self.conn()?;
        let context = serde_json::to_string(&group.context)?;

        conn.execute(
            r#"
            INSERT INTO groups (id, name, description, category, color, context)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                group.id,
                group.name,
                group.description,
                group.category.as_str(),
                group.color,
                context,
            ],
        )?;

        for member in &group.members {
            conn.execute(
                "INSERT OR IGNORE INTO group_members (group_id, member_id) VALUES (?, ?)",
                params![group.id, member.id],
            )?;
        }

        Ok(())
    }

    /// List all groups with their member rosters
    pub fn list_groups(&self) -> Result<Vec<ExpenseGroup>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, category, color, context FROM groups ORDER BY created_at, id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut groups = Vec::new();
        for row in rows {
            let (id, name, description, category, color, context) = row?;
            let members = self.group_members(&id)?;
            groups.push(ExpenseGroup {
                id,
                name,
                description,
                category: category.parse().unwrap_or(GroupCategory::Other),
                color,
                members,
                context: serde_json::from_str::<MatchContext>(&context).unwrap_or_default(),
            });
        }
        Ok(groups)
    }

    /// Get one group by id
    pub fn get_group(&self, id: &str) -> Result<Option<ExpenseGroup>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, description, category, color, context FROM groups WHERE id = ?",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, name, description, category, color, context)) => {
                let members = self.group_members(&id)?;
                Ok(Some(ExpenseGroup {
                    id,
                    name,
                    description,
                    category: category.parse().unwrap_or(GroupCategory::Other),
                    color,
                    members,
                    context: serde_json::from_str::<MatchContext>(&context).unwrap_or_default(),
                }))
            }
            None => Ok(None),
        }
    }

    fn group_members(&self, group_id: &str) -> Result<Vec<Member>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT m.id, m.name, m.email
            FROM members m
            JOIN group_members gm ON gm.member_id = m.id
            WHERE gm.group_id = ?
            ORDER BY m.name, m.id
            "#,
        )?;

        let rows = stmt.query_map(params![group_id], |row| {
            Ok(Member {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }
}
